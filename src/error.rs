//! Error taxonomy for block-graph mutations.
//!
//! Every variant except [`GraphError::InvariantViolation`] is recoverable: the
//! operation that produced it has left the graph exactly as it found it.

use crate::arena::BlockId;
use crate::dock::DockTag;

/// Errors reported by [`crate::graph::BlockGraph`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("dock {dock} of block {block} ({found:?}) cannot accept a {offered:?} connector")]
    IncompatibleDock {
        block: BlockId,
        dock: usize,
        found: DockTag,
        offered: DockTag,
    },

    #[error("dock {dock} of block {block} is already occupied")]
    SlotOccupied { block: BlockId, dock: usize },

    #[error("invalid resize of block {block}: {reason}")]
    InvalidResize { block: BlockId, reason: String },

    #[error("attaching {child} below {parent} would make it its own ancestor")]
    Cycle { parent: BlockId, child: BlockId },

    #[error("block {0} is no longer in the graph")]
    DetachedReference(BlockId),

    #[error("block {block} has no dock {dock}")]
    NoSuchDock { block: BlockId, dock: usize },

    #[error("block {0} is in the trash and cannot link to a live block")]
    Trashed(BlockId),

    #[error("block {0} cannot be collapsed")]
    NotCollapsible(BlockId),

    #[error("invalid value for block {block}: {reason}")]
    InvalidValue { block: BlockId, reason: String },

    /// A docks/connections mismatch or similar core bug. Fatal to the
    /// mutation that detected it.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl GraphError {
    /// Returns true for errors that indicate a bug in the core rather than a
    /// rejected request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GraphError::InvariantViolation(_))
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
