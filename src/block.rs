use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::BlockId;
use crate::dock::Dock;
use crate::kind::BlockKind;

// ────────────────────────────────────────────────────────────────────────────
// Supporting types
// ────────────────────────────────────────────────────────────────────────────

/// Container-level position or dock offset in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Size of a block as reported by the shape generator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Geometry {
    pub width: f32,
    pub height: f32,
    /// Height of the clickable part (the header, for clamps).
    pub hit_height: f32,
}

/// Mutable shape parameters of a block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Rows per body region, each at least 1.
    #[serde(default)]
    pub clamp_body_counts: Vec<usize>,
    /// Rows per variable argument region, each at least 1.
    #[serde(default)]
    pub arg_slot_counts: Vec<usize>,
}

/// Literal payload of value and named blocks. Not interpreted by the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl BlockValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlockValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for BlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockValue::Bool(b) => write!(f, "{}", b),
            BlockValue::Number(n) => write!(f, "{}", n),
            BlockValue::Text(s) => f.write_str(s),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// One visual program unit.
///
/// `docks` and `connections` are parallel: `connections[i]` is the neighbour
/// docked at `docks[i]`. Index 0 is the upstream link, so a block whose
/// `connections[0]` is `None` is a stack root.
///
/// Only [`crate::graph::BlockGraph`] mutates blocks; everything outside the
/// crate reads them through the accessors below.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) kind: BlockKind,
    pub(crate) configuration: Configuration,
    pub(crate) docks: Vec<Dock>,
    pub(crate) connections: Vec<Option<BlockId>>,
    pub(crate) position: Point,
    pub(crate) geometry: Geometry,
    /// Outline descriptor from the shape generator, handed to the renderer.
    pub(crate) outline: String,
    pub(crate) value: Option<BlockValue>,
    pub(crate) collapsed: bool,
    /// Container visibility.
    pub(crate) visible: bool,
    pub(crate) trash: bool,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn docks(&self) -> &[Dock] {
        &self.docks
    }

    pub fn connections(&self) -> &[Option<BlockId>] {
        &self.connections
    }

    /// Neighbour docked at `dock`, if any.
    pub fn connection(&self, dock: usize) -> Option<BlockId> {
        self.connections.get(dock).copied().flatten()
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.connection(0)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Occupied downstream docks as `(dock index, neighbour)`, in dock order.
    pub fn children(&self) -> impl Iterator<Item = (usize, BlockId)> + '_ {
        self.connections
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, c)| c.map(|id| (i, id)))
    }

    /// Index of the dock through which `neighbour` is attached.
    pub fn dock_of(&self, neighbour: BlockId) -> Option<usize> {
        self.connections.iter().position(|&c| c == Some(neighbour))
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Absolute position of a dock.
    pub fn dock_position(&self, dock: usize) -> Option<Point> {
        self.docks
            .get(dock)
            .map(|d| self.position.offset(d.x, d.y))
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn outline(&self) -> &str {
        &self.outline
    }

    pub fn value(&self) -> Option<&BlockValue> {
        self.value.as_ref()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_trashed(&self) -> bool {
        self.trash
    }
}
