//! Sending stacks to the trash and back.
//!
//! Trashed blocks stay in the arena, hidden and flagged, until the trash is
//! emptied. A stack keeps its internal connections while in the trash.

use super::BlockGraph;
use crate::arena::BlockId;
use crate::error::{GraphError, GraphResult};
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    /// Detach `start` from its parent and move its drag group to the trash.
    ///
    /// Returns the parent link that was cut, if any. Trashing a block that is
    /// already in the trash does nothing.
    pub fn send_to_trash(&mut self, start: BlockId) -> GraphResult<Option<(BlockId, usize)>> {
        let block = self.block(start)?;
        if block.trash {
            return Ok(None);
        }
        let parent = match block.parent() {
            Some(p) => {
                let dock = self.block(p)?.dock_of(start).ok_or_else(|| {
                    GraphError::InvariantViolation(format!("{} does not link back to {}", p, start))
                })?;
                Some((p, dock))
            }
            None => None,
        };
        let group = self.find_drag_group(start)?;

        for &id in &group {
            self.block_mut(id)?.trash = true;
        }
        if let Some((p, dock)) = parent {
            self.disconnect(p, dock)?;
            self.adjust_docks(p, true)?;
        }
        for &id in &group {
            self.set_visible(id, false)?;
        }
        log::debug!("trashed {} ({} block(s))", start, group.len());
        Ok(parent)
    }

    /// Bring the trashed stack containing `id` back as a visible stack root.
    /// Blocks under a collapsed block stay hidden. Returns the stack root.
    pub fn restore_from_trash(&mut self, id: BlockId) -> GraphResult<BlockId> {
        let start = self.find_top_block(id)?;
        if !self.block(start)?.trash {
            return Ok(start);
        }
        let group = self.find_drag_group(start)?;
        for &id in &group {
            self.block_mut(id)?.trash = false;
        }
        self.reveal_root(start)?;
        log::debug!("restored {} ({} block(s))", start, group.len());
        Ok(start)
    }

    /// Trashed blocks, in arena order.
    pub fn trashed(&self) -> Vec<BlockId> {
        self.iter().filter(|b| b.trash).map(|b| b.id).collect()
    }

    /// Destroy every trashed block. Returns the removed ids.
    pub fn empty_trash(&mut self) -> GraphResult<Vec<BlockId>> {
        let doomed = self.trashed();
        for &id in &doomed {
            self.remove_block(id)?;
        }
        log::debug!("emptied trash of {} block(s)", doomed.len());
        Ok(doomed)
    }
}
