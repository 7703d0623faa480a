//! Drag groups and the drag gesture.
//!
//! A drag group is the block being dragged plus everything docked below it:
//! arguments, clamp bodies and following statements, but never its parent.
//! The same group decides what collapses together and what goes to the trash.

use std::collections::HashSet;

use super::BlockGraph;
use crate::arena::BlockId;
use crate::block::Point;
use crate::error::{GraphError, GraphResult};
use crate::operations::GraphCommand;
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    /// Blocks that move with `start`, `start` first, then depth-first in dock
    /// order. Repeated calls on an unchanged graph return the same sequence.
    pub fn find_drag_group(&self, start: BlockId) -> GraphResult<Vec<BlockId>> {
        self.block(start)?;
        let mut group = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                let msg = format!("block {} reached twice while collecting drag group", id);
                log::error!("{}", msg);
                return Err(GraphError::InvariantViolation(msg));
            }
            group.push(id);
            let block = self.block(id)?;
            let children: Vec<BlockId> = block.children().map(|(_, c)| c).collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(group)
    }

    /// Move `start` and its drag group by a delta. Returns the group.
    pub fn move_stack(&mut self, start: BlockId, dx: f32, dy: f32) -> GraphResult<Vec<BlockId>> {
        let group = self.find_drag_group(start)?;
        for &id in &group {
            self.move_relative(id, dx, dy)?;
        }
        Ok(group)
    }

    /// Nearest free dock that would accept `start`, within the configured snap
    /// radius of its upstream dock.
    ///
    /// Blocks in `start`'s own drag group are never targets, nor are blocks
    /// that are trashed, hidden or collapsed.
    pub fn find_snap_dock(&self, start: BlockId) -> GraphResult<Option<(BlockId, usize)>> {
        let block = self.block(start)?;
        let plug = block.docks[0];
        let origin = block.position.offset(plug.x, plug.y);
        let group: HashSet<BlockId> = self.find_drag_group(start)?.into_iter().collect();
        let radius = self.config().snap_radius;

        let mut best: Option<(BlockId, usize, f32)> = None;
        for candidate in self.iter() {
            if group.contains(&candidate.id)
                || candidate.trash
                || !candidate.visible
                || candidate.collapsed
            {
                continue;
            }
            for (dock, socket) in candidate.docks.iter().enumerate().skip(1) {
                if candidate.connections[dock].is_some() || !socket.tag.is_compatible(plug.tag) {
                    continue;
                }
                let dist = candidate.position.offset(socket.x, socket.y).distance(origin);
                if dist < radius && best.map_or(true, |b| dist < b.2) {
                    best = Some((candidate.id, dock, dist));
                }
            }
        }
        Ok(best.map(|(id, dock, _)| (id, dock)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DragGesture
// ────────────────────────────────────────────────────────────────────────────

/// One pointer-down / move / up sequence over a block.
///
/// Moving never changes structure. Only [`DragGesture::drop_on`] disconnects
/// and connects, so a cancelled gesture leaves every connection as it was.
#[derive(Debug, Clone)]
pub struct DragGesture {
    start: BlockId,
    group: Vec<BlockId>,
    origins: Vec<Point>,
    dx: f32,
    dy: f32,
}

impl DragGesture {
    /// Snapshot the drag group of `start` and its positions.
    pub fn begin<S: ShapeGenerator, R: RenderAdapter>(
        graph: &BlockGraph<S, R>,
        start: BlockId,
    ) -> GraphResult<Self> {
        let group = graph.find_drag_group(start)?;
        let origins = group
            .iter()
            .map(|&id| graph.block(id).map(|b| b.position))
            .collect::<GraphResult<Vec<_>>>()?;
        log::debug!("drag of {} begins with {} block(s)", start, group.len());
        Ok(Self {
            start,
            group,
            origins,
            dx: 0.0,
            dy: 0.0,
        })
    }

    pub fn start(&self) -> BlockId {
        self.start
    }

    pub fn group(&self) -> &[BlockId] {
        &self.group
    }

    /// Accumulated pointer offset since `begin`.
    pub fn offset(&self) -> (f32, f32) {
        (self.dx, self.dy)
    }

    pub fn drag_by<S: ShapeGenerator, R: RenderAdapter>(
        &mut self,
        graph: &mut BlockGraph<S, R>,
        dx: f32,
        dy: f32,
    ) -> GraphResult<()> {
        for &id in &self.group {
            graph.move_relative(id, dx, dy)?;
        }
        self.dx += dx;
        self.dy += dy;
        Ok(())
    }

    /// Abort the gesture and put every block back where it started.
    pub fn cancel<S: ShapeGenerator, R: RenderAdapter>(
        self,
        graph: &mut BlockGraph<S, R>,
    ) -> GraphResult<()> {
        log::debug!("drag of {} cancelled", self.start);
        self.restore_positions(graph)
    }

    fn restore_positions<S: ShapeGenerator, R: RenderAdapter>(
        &self,
        graph: &mut BlockGraph<S, R>,
    ) -> GraphResult<()> {
        for (&id, &origin) in self.group.iter().zip(&self.origins) {
            if graph.contains(id) {
                graph.move_block(id, origin)?;
            }
        }
        Ok(())
    }

    /// Finish the gesture: detach from the old parent and dock into `target`
    /// if given. Returns the undoable command for the whole drop.
    ///
    /// If the target rejects the block, the old link and all positions are
    /// restored and the error is returned.
    pub fn drop_on<S: ShapeGenerator, R: RenderAdapter>(
        self,
        graph: &mut BlockGraph<S, R>,
        target: Option<(BlockId, usize)>,
    ) -> GraphResult<GraphCommand> {
        let block = graph.block(self.start)?;
        let old_parent = match block.parent() {
            Some(p) => {
                let dock = graph.block(p)?.dock_of(self.start).ok_or_else(|| {
                    GraphError::InvariantViolation(format!(
                        "{} does not link back to {}",
                        p, self.start
                    ))
                })?;
                Some((p, dock))
            }
            None => None,
        };

        // Dropped back where it came from: snap back, nothing to record.
        if let Some((p, _)) = old_parent.filter(|_| old_parent == target) {
            graph.adjust_docks(p, true)?;
            return Ok(GraphCommand::Batch(Vec::new()));
        }

        let mut commands = Vec::new();
        if let Some((parent, dock)) = old_parent {
            graph.disconnect(parent, dock)?;
            commands.push(GraphCommand::Disconnect {
                parent,
                dock,
                child: self.start,
            });
        }

        if let Some((parent, dock)) = target {
            if let Err(e) = graph.connect(parent, dock, self.start) {
                log::warn!("drop of {} on {}[{}] rejected: {}", self.start, parent, dock, e);
                if let Some((p, d)) = old_parent {
                    graph.connect(p, d, self.start)?;
                }
                self.restore_positions(graph)?;
                return Err(e);
            }
            graph.adjust_docks(parent, true)?;
        }

        // Recorded between the two structural steps so undo detaches, moves
        // back, then re-attaches.
        let origin = self.origins[0];
        let end = graph.block(self.start)?.position;
        let (dx, dy) = (end.x - origin.x, end.y - origin.y);
        if dx != 0.0 || dy != 0.0 {
            commands.push(GraphCommand::MoveStack {
                root: self.start,
                dx,
                dy,
            });
        }
        if let Some((parent, dock)) = target {
            commands.push(GraphCommand::Connect {
                parent,
                dock,
                child: self.start,
            });
        }
        log::debug!("drag of {} dropped on {:?}", self.start, target);
        Ok(GraphCommand::Batch(commands))
    }
}
