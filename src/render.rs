//! Notifications from the graph to whatever paints it.
//!
//! The graph calls these after a change has been fully applied. Adapters must
//! not call back into the graph; they only schedule repaints.

use serde::Serialize;

use crate::arena::BlockId;
use crate::block::Block;

pub trait RenderAdapter {
    /// Position, size, outline or label of `block` changed.
    fn on_geometry_changed(&mut self, block: &Block);
    /// Container visibility or collapsed glyph of `block` changed.
    fn on_visibility_changed(&mut self, block: &Block);
}

/// Adapter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RenderAdapter for NullRenderer {
    fn on_geometry_changed(&mut self, _block: &Block) {}
    fn on_visibility_changed(&mut self, _block: &Block) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "block", rename_all = "snake_case")]
pub enum RenderEvent {
    Geometry(BlockId),
    Visibility(BlockId),
}

/// Adapter that records notifications in order.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    pub events: Vec<RenderEvent>,
}

impl RenderLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn geometry_changes(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.events.iter().filter_map(|e| match e {
            RenderEvent::Geometry(id) => Some(*id),
            _ => None,
        })
    }

    pub fn visibility_changes(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.events.iter().filter_map(|e| match e {
            RenderEvent::Visibility(id) => Some(*id),
            _ => None,
        })
    }
}

impl RenderAdapter for RenderLog {
    fn on_geometry_changed(&mut self, block: &Block) {
        self.events.push(RenderEvent::Geometry(block.id()));
    }

    fn on_visibility_changed(&mut self, block: &Block) {
        self.events.push(RenderEvent::Visibility(block.id()));
    }
}
