//! The block arena and the dock/connection protocol.
//!
//! [`BlockGraph`] exclusively owns every [`Block`]. Connections are plain
//! [`BlockId`]s into the same arena; they describe structure and never own
//! anything. All structural changes go through `connect` and `disconnect`,
//! and every public mutation validates first, so a returned error means the
//! graph was not touched.
//!
//! The operations are split over submodules:
//!
//! - `resize`: configuration changes and dock remapping
//! - `drag`: drag groups, drag gestures and snapping
//! - `collapse`: the collapse/expand state machine
//! - `names`: value relabeling and named-reference renaming
//! - `trash`: sending stacks to the trash and back

mod collapse;
mod drag;
mod names;
mod resize;
mod trash;

pub use collapse::CollapseState;
pub use drag::DragGesture;
pub use names::Relabel;

use std::collections::{HashSet, VecDeque};

use crate::arena::{Arena, BlockId};
use crate::block::{Block, BlockValue, Configuration, Geometry, Point};
use crate::config::GraphConfig;
use crate::dock::Dock;
use crate::error::{GraphError, GraphResult};
use crate::kind::BlockKind;
use crate::render::{NullRenderer, RenderAdapter};
use crate::shape::{ShapeGenerator, StandardShapes};

/// Docks, geometry and outline computed for one configuration.
pub(crate) struct ShapedDocks {
    pub docks: Vec<Dock>,
    pub geometry: Geometry,
    pub outline: String,
}

/// Owning collection of blocks plus the injected shape generator and render
/// adapter.
pub struct BlockGraph<S = StandardShapes, R = NullRenderer> {
    blocks: Arena<Block>,
    shapes: S,
    renderer: R,
    config: GraphConfig,
}

impl BlockGraph {
    /// Graph with the standard shapes and no renderer.
    pub fn standard() -> Self {
        Self::new(StandardShapes::default(), NullRenderer)
    }
}

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    pub fn new(shapes: S, renderer: R) -> Self {
        Self::with_config(shapes, renderer, GraphConfig::default())
    }

    pub fn with_config(shapes: S, renderer: R, config: GraphConfig) -> Self {
        Self {
            blocks: Arena::new(),
            shapes,
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn shapes(&self) -> &S {
        &self.shapes
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ────────────────────────────────────────────────────────────────────
    // Lookup
    // ────────────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains(id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block(&self, id: BlockId) -> GraphResult<&Block> {
        self.blocks.get(id).ok_or(GraphError::DetachedReference(id))
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> GraphResult<&mut Block> {
        self.blocks
            .get_mut(id)
            .ok_or(GraphError::DetachedReference(id))
    }

    /// All blocks in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().map(|(_, b)| b)
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.ids()
    }

    /// Stack roots in arena order.
    pub fn roots(&self) -> Vec<BlockId> {
        self.iter().filter(|b| b.is_root()).map(Block::id).collect()
    }

    // ────────────────────────────────────────────────────────────────────
    // Creation and removal
    // ────────────────────────────────────────────────────────────────────

    /// Compute docks and geometry for a configuration. Fails if the shape
    /// generator disagrees with the kind's dock template.
    pub(crate) fn shape_docks(
        &self,
        kind: BlockKind,
        config: &Configuration,
    ) -> GraphResult<ShapedDocks> {
        let template = kind.dock_template(config);
        let shape = self.shapes.generate(kind, config);
        if shape.dock_offsets.len() != template.len() {
            let msg = format!(
                "shape generator returned {} dock offsets for {:?}, expected {}",
                shape.dock_offsets.len(),
                kind,
                template.len()
            );
            log::error!("{}", msg);
            return Err(GraphError::InvariantViolation(msg));
        }
        let docks = template
            .into_iter()
            .zip(shape.dock_offsets)
            .map(|((role, tag), p)| Dock {
                x: p.x,
                y: p.y,
                tag,
                role,
            })
            .collect();
        Ok(ShapedDocks {
            docks,
            geometry: Geometry {
                width: shape.width,
                height: shape.height,
                hit_height: shape.hit_height,
            },
            outline: shape.outline,
        })
    }

    /// Add a block with its default configuration at the origin.
    pub fn add_block(&mut self, kind: BlockKind) -> GraphResult<BlockId> {
        self.add_block_at(kind, Point::default())
    }

    /// Add a block with its default configuration and value. The new block has
    /// no connections and is its own stack root.
    pub fn add_block_at(&mut self, kind: BlockKind, position: Point) -> GraphResult<BlockId> {
        let id = self.insert_block(kind, position)?;
        self.notify_geometry(id);
        Ok(id)
    }

    /// Store a fresh block without telling the renderer about it.
    fn insert_block(&mut self, kind: BlockKind, position: Point) -> GraphResult<BlockId> {
        let configuration = kind.default_configuration();
        let shaped = self.shape_docks(kind, &configuration)?;
        let connections = vec![None; shaped.docks.len()];
        let id = self.blocks.insert_with(|id| Block {
            id,
            kind,
            configuration,
            docks: shaped.docks,
            connections,
            position,
            geometry: shaped.geometry,
            outline: shaped.outline,
            value: kind.default_value(),
            collapsed: false,
            visible: true,
            trash: false,
        });
        log::debug!("added {:?} block {}", kind, id);
        Ok(id)
    }

    /// Add a value-carrying block and set its value. The renderer hears of the
    /// block only once the value is in place.
    pub fn add_value_block(
        &mut self,
        kind: BlockKind,
        value: BlockValue,
        position: Point,
    ) -> GraphResult<BlockId> {
        let id = self.insert_block(kind, position)?;
        if let Err(e) = self.relabel(id, value) {
            self.blocks.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Destroy a block. Its parent link is cut and its children are detached
    /// (they become stack roots), never deleted.
    pub fn remove_block(&mut self, id: BlockId) -> GraphResult<Block> {
        let block = self.block(id)?;
        let parent = block.parent();
        let children: Vec<usize> = block.children().map(|(i, _)| i).collect();

        if let Some(p) = parent {
            let dock = self.block(p)?.dock_of(id).ok_or_else(|| {
                GraphError::InvariantViolation(format!("{} does not link back to child {}", p, id))
            })?;
            self.disconnect(p, dock)?;
        }
        for dock in children {
            self.disconnect(id, dock)?;
        }

        self.set_visible(id, false)?;
        let removed = self
            .blocks
            .remove(id)
            .ok_or(GraphError::DetachedReference(id))?;
        log::debug!("removed {:?} block {}", removed.kind, id);
        Ok(removed)
    }

    // ────────────────────────────────────────────────────────────────────
    // Connection protocol
    // ────────────────────────────────────────────────────────────────────

    /// Dock `b` (through its upstream dock) into dock `dock` of `a`.
    ///
    /// Only records adjacency; positions and sizes are left alone until the
    /// caller runs [`BlockGraph::adjust_docks`]. A stack docked below a
    /// collapsed or hidden block is hidden with it. A trashed block and a live
    /// block never link.
    pub fn connect(&mut self, a: BlockId, dock: usize, b: BlockId) -> GraphResult<()> {
        let parent = self.block(a)?;
        let child = self.block(b)?;

        let socket = *parent
            .docks
            .get(dock)
            .ok_or(GraphError::NoSuchDock { block: a, dock })?;
        if a == b {
            return Err(GraphError::Cycle {
                parent: a,
                child: b,
            });
        }
        if parent.trash != child.trash {
            return Err(GraphError::Trashed(if parent.trash { a } else { b }));
        }
        if parent.connections[dock].is_some() {
            return Err(GraphError::SlotOccupied { block: a, dock });
        }
        let plug = child.docks[0];
        if !socket.tag.is_compatible(plug.tag) {
            log::warn!(
                "rejected {:?} into {:?} at {}[{}]",
                plug.tag,
                socket.tag,
                a,
                dock
            );
            return Err(GraphError::IncompatibleDock {
                block: a,
                dock,
                found: socket.tag,
                offered: plug.tag,
            });
        }
        if child.connections[0].is_some() {
            return Err(GraphError::SlotOccupied { block: b, dock: 0 });
        }
        if self.ancestors(a)?.contains(&b) {
            return Err(GraphError::Cycle {
                parent: a,
                child: b,
            });
        }

        self.block_mut(a)?.connections[dock] = Some(b);
        self.block_mut(b)?.connections[0] = Some(a);
        log::debug!("connected {} into {}[{}]", b, a, dock);

        if !self.shows_children(a)? {
            for id in self.find_drag_group(b)? {
                self.set_visible(id, false)?;
            }
        }
        Ok(())
    }

    /// Cut the link at `dock` of `a`, returning the neighbour that was there.
    ///
    /// For a downstream dock the returned neighbour is now a stack root. For
    /// dock 0 the returned block is the former parent and `a` is the new root.
    /// A new root that is not in the trash is shown, together with everything
    /// below it that is not folded away.
    pub fn disconnect(&mut self, a: BlockId, dock: usize) -> GraphResult<Option<BlockId>> {
        let block = self.block(a)?;
        let neighbour = match block.connections.get(dock) {
            None => return Err(GraphError::NoSuchDock { block: a, dock }),
            Some(None) => return Ok(None),
            Some(Some(n)) => *n,
        };
        let back = self.block(neighbour)?.dock_of(a).ok_or_else(|| {
            let msg = format!("{} is linked to {} but not the other way round", a, neighbour);
            log::error!("{}", msg);
            GraphError::InvariantViolation(msg)
        })?;

        self.block_mut(a)?.connections[dock] = None;
        self.block_mut(neighbour)?.connections[back] = None;
        log::debug!("disconnected {} from {}[{}]", neighbour, a, dock);

        self.reveal_root(if dock == 0 { a } else { neighbour })?;
        Ok(Some(neighbour))
    }

    /// Chain of parents above `id`, nearest first.
    fn ancestors(&self, id: BlockId) -> GraphResult<Vec<BlockId>> {
        let mut chain = Vec::new();
        let mut current = self.block(id)?.parent();
        while let Some(p) = current {
            if chain.len() > self.blocks.len() {
                let msg = format!("parent chain above {} does not terminate", id);
                log::error!("{}", msg);
                return Err(GraphError::InvariantViolation(msg));
            }
            chain.push(p);
            current = self.block(p)?.parent();
        }
        Ok(chain)
    }

    /// Follow upstream links to the root of the stack containing `id`.
    pub fn find_top_block(&self, id: BlockId) -> GraphResult<BlockId> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    // ────────────────────────────────────────────────────────────────────
    // Geometry propagation
    // ────────────────────────────────────────────────────────────────────

    /// Reposition every downstream neighbour of `id` so its connecting dock
    /// sits on the matching dock of `id`. With `recursive`, the pass continues
    /// breadth-first through every repositioned neighbour.
    pub fn adjust_docks(&mut self, id: BlockId, recursive: bool) -> GraphResult<()> {
        self.block(id)?;
        let mut queue = VecDeque::from([id]);
        let mut seen = HashSet::new();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let block = self.block(current)?;
            if block.docks.len() != block.connections.len() {
                let msg = format!(
                    "block {} has {} docks but {} connections",
                    current,
                    block.docks.len(),
                    block.connections.len()
                );
                log::error!("{}", msg);
                return Err(GraphError::InvariantViolation(msg));
            }

            let mut moves = Vec::new();
            for (dock, child) in block.children() {
                let anchor = block.dock_position(dock).unwrap_or(block.position);
                let child_block = self.block(child)?;
                let back = child_block.dock_of(current).ok_or_else(|| {
                    GraphError::InvariantViolation(format!(
                        "{} is docked in {} but does not link back",
                        child, current
                    ))
                })?;
                let plug = child_block.docks[back];
                moves.push((child, Point::new(anchor.x - plug.x, anchor.y - plug.y)));
            }

            for (child, position) in moves {
                let block = self.block_mut(child)?;
                if block.position != position {
                    log::trace!("adjust {} -> ({}, {})", child, position.x, position.y);
                    block.position = position;
                    self.notify_geometry(child);
                }
                if recursive {
                    queue.push_back(child);
                }
            }
        }
        Ok(())
    }

    /// Put `id` back onto its parent's dock after its own docks moved.
    pub(crate) fn seat_on_parent(&mut self, id: BlockId) -> GraphResult<()> {
        let block = self.block(id)?;
        let Some(parent) = block.parent() else {
            return Ok(());
        };
        let plug = block.docks[0];
        let parent_block = self.block(parent)?;
        let dock = parent_block.dock_of(id).ok_or_else(|| {
            GraphError::InvariantViolation(format!("{} does not link back to {}", parent, id))
        })?;
        let anchor = parent_block
            .dock_position(dock)
            .unwrap_or(parent_block.position);
        let position = Point::new(anchor.x - plug.x, anchor.y - plug.y);
        let block = self.block_mut(id)?;
        if block.position != position {
            block.position = position;
            self.notify_geometry(id);
        }
        Ok(())
    }

    /// Move one block's container. Docked neighbours are not moved.
    pub fn move_block(&mut self, id: BlockId, position: Point) -> GraphResult<()> {
        let block = self.block_mut(id)?;
        if block.position != position {
            block.position = position;
            self.notify_geometry(id);
        }
        Ok(())
    }

    pub fn move_relative(&mut self, id: BlockId, dx: f32, dy: f32) -> GraphResult<()> {
        let position = self.block(id)?.position.offset(dx, dy);
        self.move_block(id, position)
    }

    // ────────────────────────────────────────────────────────────────────
    // Presentation helpers
    // ────────────────────────────────────────────────────────────────────

    pub(crate) fn set_visible(&mut self, id: BlockId, visible: bool) -> GraphResult<()> {
        let block = self.block_mut(id)?;
        if block.visible != visible {
            block.visible = visible;
            self.notify_visibility(id);
        }
        Ok(())
    }

    pub(crate) fn notify_geometry(&mut self, id: BlockId) {
        if let Some(block) = self.blocks.get(id) {
            self.renderer.on_geometry_changed(block);
        }
    }

    pub(crate) fn notify_visibility(&mut self, id: BlockId) {
        if let Some(block) = self.blocks.get(id) {
            self.renderer.on_visibility_changed(block);
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Invariants
    // ────────────────────────────────────────────────────────────────────

    /// Verify connection symmetry, dock compatibility, parallel dock and
    /// connection lists, valid configurations, acyclicity and visibility.
    pub fn check_invariants(&self) -> GraphResult<()> {
        let fail = |msg: String| Err(GraphError::InvariantViolation(msg));

        for block in self.iter() {
            let id = block.id;
            if block.docks.len() != block.connections.len() {
                return fail(format!("{}: docks and connections differ in length", id));
            }
            if let Err(reason) = block.kind.validate(&block.configuration) {
                return fail(format!("{}: {}", id, reason));
            }
            for (dock, neighbour) in block.connections.iter().enumerate() {
                let Some(n) = *neighbour else { continue };
                let Some(other) = self.get(n) else {
                    return fail(format!("{}[{}] points at removed block {}", id, dock, n));
                };
                let back: Vec<usize> = other
                    .connections
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c == Some(id))
                    .map(|(i, _)| i)
                    .collect();
                if back.len() != 1 {
                    return fail(format!(
                        "{}[{}] -> {} is mirrored {} times",
                        id,
                        dock,
                        n,
                        back.len()
                    ));
                }
                if (dock == 0) == (back[0] == 0) {
                    return fail(format!("{}[{}] -> {} is not a parent/child link", id, dock, n));
                }
                if !block.docks[dock].tag.is_compatible(other.docks[back[0]].tag) {
                    return fail(format!("{}[{}] -> {} joins incompatible docks", id, dock, n));
                }
                if block.trash != other.trash {
                    return fail(format!("{}[{}] -> {} crosses the trash", id, dock, n));
                }
            }
            let shown = match block.parent() {
                Some(p) => self.shows_children(p)?,
                None => !block.trash,
            };
            if block.visible != shown {
                return fail(format!("{} visible={} but should be {}", id, block.visible, shown));
            }
            self.find_top_block(id)?;
        }
        Ok(())
    }
}
