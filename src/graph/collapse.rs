//! Collapse / expand of collapsible blocks.
//!
//! Collapsing is presentation only: the drag group below the block is hidden
//! and the block shows its compact glyph, but no connection changes. Nested
//! collapsible blocks keep their own flag; an ancestor only drives their
//! container visibility.

use serde::Serialize;

use super::BlockGraph;
use crate::arena::BlockId;
use crate::error::{GraphError, GraphResult};
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseState {
    Expanded,
    Collapsed,
}

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    pub fn collapse_state(&self, id: BlockId) -> GraphResult<CollapseState> {
        let block = self.block(id)?;
        if !block.kind.is_collapsible() {
            return Err(GraphError::NotCollapsible(id));
        }
        Ok(if block.collapsed {
            CollapseState::Collapsed
        } else {
            CollapseState::Expanded
        })
    }

    /// Flip the state of a collapsible block and return the new state.
    pub fn toggle_collapse(&mut self, id: BlockId) -> GraphResult<CollapseState> {
        match self.collapse_state(id)? {
            CollapseState::Expanded => self.collapse(id)?,
            CollapseState::Collapsed => self.expand(id)?,
        }
        self.collapse_state(id)
    }

    /// Hide everything in the drag group below `id`. No-op when already
    /// collapsed.
    pub fn collapse(&mut self, id: BlockId) -> GraphResult<()> {
        if self.collapse_state(id)? == CollapseState::Collapsed {
            return Ok(());
        }
        let group = self.find_drag_group(id)?;
        for &member in group.iter().skip(1) {
            self.set_visible(member, false)?;
        }
        self.block_mut(id)?.collapsed = true;
        self.notify_visibility(id);
        log::debug!("collapsed {} ({} block(s) hidden)", id, group.len() - 1);
        Ok(())
    }

    /// Show the drag group below `id` again. Blocks under a nested collapsed
    /// block and trashed blocks stay hidden. While `id` itself is hidden only
    /// its flag changes. No-op when already expanded.
    pub fn expand(&mut self, id: BlockId) -> GraphResult<()> {
        if self.collapse_state(id)? == CollapseState::Expanded {
            return Ok(());
        }
        self.block_mut(id)?.collapsed = false;
        self.notify_visibility(id);
        if self.shows_children(id)? {
            self.reveal_below(id)?;
        }
        log::debug!("expanded {}", id);
        Ok(())
    }

    /// Whether blocks docked below `id` are on screen.
    pub(crate) fn shows_children(&self, id: BlockId) -> GraphResult<bool> {
        let block = self.block(id)?;
        Ok(block.visible && !block.collapsed && !block.trash)
    }

    /// Show a block that has just become a stack root, and what it does not
    /// fold away. Trashed roots stay hidden.
    pub(crate) fn reveal_root(&mut self, root: BlockId) -> GraphResult<()> {
        let block = self.block(root)?;
        if block.trash || block.visible {
            return Ok(());
        }
        self.set_visible(root, true)?;
        if self.shows_children(root)? {
            self.reveal_below(root)?;
        }
        Ok(())
    }

    /// Make the blocks below `id` visible, stopping at collapsed blocks.
    pub(crate) fn reveal_below(&mut self, id: BlockId) -> GraphResult<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let children: Vec<BlockId> = self.block(current)?.children().map(|(_, c)| c).collect();
            for child in children {
                let block = self.block(child)?;
                let folded = block.kind.is_collapsible() && block.collapsed;
                let visible = !block.trash;
                self.set_visible(child, visible)?;
                if !folded {
                    stack.push(child);
                }
            }
        }
        Ok(())
    }
}
