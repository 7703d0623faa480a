//! Typed connection points.

use serde::{Deserialize, Serialize};

/// Connector type of a dock.
///
/// Sockets that receive something are `*In`; the plug a block offers to its
/// parent is `*Out`. `FlowOut` is the top notch of a statement block and
/// `FlowIn` the socket below it (or inside a clamp body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockTag {
    FlowIn,
    FlowOut,
    NumberIn,
    NumberOut,
    TextIn,
    TextOut,
    BooleanIn,
    BooleanOut,
    MediaIn,
    MediaOut,
    AnyIn,
    AnyOut,
    /// Upstream dock of blocks that can only be stack roots.
    Unavailable,
}

impl DockTag {
    /// Whether a socket of type `self` accepts a plug of type `plug`.
    fn accepts(self, plug: DockTag) -> bool {
        use DockTag::*;
        match self {
            FlowIn => plug == FlowOut,
            NumberIn => matches!(plug, NumberOut | AnyOut),
            TextIn => matches!(plug, TextOut | AnyOut),
            BooleanIn => plug == BooleanOut,
            MediaIn => matches!(plug, MediaOut | TextOut),
            AnyIn => matches!(plug, NumberOut | TextOut | BooleanOut | MediaOut | AnyOut),
            _ => false,
        }
    }

    /// Symmetric compatibility check between two dock types.
    pub fn is_compatible(self, other: DockTag) -> bool {
        self.accepts(other) || other.accepts(self)
    }

    pub fn is_socket(self) -> bool {
        use DockTag::*;
        matches!(
            self,
            FlowIn | NumberIn | TextIn | BooleanIn | MediaIn | AnyIn
        )
    }
}

/// What a dock means for its block, independent of where it sits in the
/// dock list. Resizing uses roles to carry connections across layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DockRole {
    /// The connector through which the block hangs off its parent.
    Upstream,
    /// Fixed argument socket, numbered left to right.
    Arg { index: usize },
    /// Entry socket of a clamp body.
    Body { index: usize },
    /// One row of a variable argument region.
    Slot { region: usize, row: usize },
    /// Socket for the following statement.
    Next,
}

/// A positioned, typed connection point relative to the block's origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dock {
    pub x: f32,
    pub y: f32,
    pub tag: DockTag,
    pub role: DockRole,
}
