//! Block-graph core for a drag-and-drop visual program editor.
//!
//! This crate keeps the structure of a block program (which block is docked
//! into which dock of which other block) and everything that follows from it:
//! resizing variable-arity blocks, collecting the group that moves with a
//! dragged block, collapsing and expanding, trashing, renaming and undo.
//!
//! Drawing is delegated: a [`shape::ShapeGenerator`] turns a kind and
//! configuration into an outline and dock offsets, and a
//! [`render::RenderAdapter`] is told whenever a block needs repainting.
//!
//! The binary `stackblocks` replays a JSON edit script and prints the
//! resulting graph as JSON.

pub mod arena;
pub mod block;
pub mod config;
pub mod dock;
pub mod error;
pub mod graph;
pub mod kind;
pub mod operations;
pub mod render;
pub mod script;
pub mod shape;

pub use arena::BlockId;
pub use block::{Block, BlockValue, Configuration, Geometry, Point};
pub use config::GraphConfig;
pub use dock::{Dock, DockRole, DockTag};
pub use error::{GraphError, GraphResult};
pub use graph::{BlockGraph, CollapseState, DragGesture, Relabel};
pub use kind::BlockKind;
pub use operations::{GraphCommand, GraphHistory};
pub use render::{NullRenderer, RenderAdapter, RenderEvent, RenderLog};
pub use shape::{Shape, ShapeGenerator, StandardShapes};
