//! Undoable editing operations on a [`BlockGraph`].
//!
//! Each operation here performs one user-level edit through the graph and
//! returns a [`GraphCommand`] describing it. [`GraphHistory`] keeps those
//! commands and undoes or redoes them by applying their inverses.
//!
//! # Design
//!
//! `Connect` and `Disconnect` are purely structural. Any displacement caused
//! by docking is recorded as a separate `MoveStack`, so replaying a command
//! never moves a block twice.

use crate::arena::BlockId;
use crate::block::{BlockValue, Configuration};
use crate::error::{GraphError, GraphResult};
use crate::graph::BlockGraph;
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

// ────────────────────────────────────────────────────────────────────────────
// Graph Command (undo/redo unit)
// ────────────────────────────────────────────────────────────────────────────

/// A single undoable graph edit.
///
/// Each variant captures enough state to reverse the edit.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCommand {
    /// Dock `child` into `dock` of `parent`.
    Connect {
        parent: BlockId,
        dock: usize,
        child: BlockId,
    },
    /// Cut the link between `parent[dock]` and `child`.
    Disconnect {
        parent: BlockId,
        dock: usize,
        child: BlockId,
    },
    /// Move the drag group of `root` by a delta.
    MoveStack { root: BlockId, dx: f32, dy: f32 },
    /// Change the configuration of `block`, with its downstream links on both
    /// sides of the change.
    Reshape {
        block: BlockId,
        before: Configuration,
        after: Configuration,
        before_links: Vec<(usize, BlockId)>,
        after_links: Vec<(usize, BlockId)>,
    },
    /// Flip the collapse state of `block`.
    ToggleCollapse { block: BlockId },
    /// Replace the value of `block`.
    Relabel {
        block: BlockId,
        old: BlockValue,
        new: BlockValue,
    },
    /// Send the stack at `root` to the trash, cutting it from `parent`.
    Trash {
        root: BlockId,
        parent: Option<(BlockId, usize)>,
    },
    /// Bring the stack at `root` back from the trash, re-docking it into
    /// `parent`.
    Restore {
        root: BlockId,
        parent: Option<(BlockId, usize)>,
    },
    /// Batch command combining multiple sub-commands, applied in order.
    Batch(Vec<GraphCommand>),
}

impl GraphCommand {
    /// Returns true for a batch with nothing in it, at any depth.
    pub fn is_empty(&self) -> bool {
        match self {
            GraphCommand::Batch(cmds) => cmds.iter().all(GraphCommand::is_empty),
            _ => false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Graph History (undo / redo stack)
// ────────────────────────────────────────────────────────────────────────────

/// Undo/redo history for a block graph.
///
/// # Example
///
/// ```rust,ignore
/// let mut history = GraphHistory::new(100);
/// let cmd = operations::toggle_collapse(&mut graph, start)?;
/// history.push(cmd);
/// history.undo(&mut graph)?; // expands again
/// history.redo(&mut graph)?; // collapses again
/// ```
#[derive(Debug, Clone)]
pub struct GraphHistory {
    undo_stack: Vec<GraphCommand>,
    redo_stack: Vec<GraphCommand>,
    max_size: usize,
}

impl GraphHistory {
    /// Create a new history with the given maximum undo depth.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Push a command onto the undo stack and clear the redo stack. Empty
    /// batches are not recorded.
    pub fn push(&mut self, cmd: GraphCommand) {
        if cmd.is_empty() {
            return;
        }
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last command, returning true if an undo was performed.
    ///
    /// If the inverse fails part way the graph no longer matches the recorded
    /// commands, so the whole history is dropped.
    pub fn undo<S: ShapeGenerator, R: RenderAdapter>(
        &mut self,
        graph: &mut BlockGraph<S, R>,
    ) -> GraphResult<bool> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match apply_inverse(graph, &cmd) {
            Ok(inverse) => {
                self.redo_stack.push(inverse);
                Ok(true)
            }
            Err(e) => {
                log::error!("undo failed, clearing history: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    /// Redo the last undone command, returning true if a redo was performed.
    pub fn redo<S: ShapeGenerator, R: RenderAdapter>(
        &mut self,
        graph: &mut BlockGraph<S, R>,
    ) -> GraphResult<bool> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match apply_inverse(graph, &cmd) {
            Ok(inverse) => {
                self.undo_stack.push(inverse);
                Ok(true)
            }
            Err(e) => {
                log::error!("redo failed, clearing history: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    /// Returns true if there are commands to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Apply the inverse of a command to the graph, returning the command that
/// undoes the inverse (the forward command for the redo stack).
fn apply_inverse<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    cmd: &GraphCommand,
) -> GraphResult<GraphCommand> {
    Ok(match cmd {
        &GraphCommand::Connect {
            parent,
            dock,
            child,
        } => {
            graph.disconnect(parent, dock)?;
            GraphCommand::Disconnect {
                parent,
                dock,
                child,
            }
        }
        &GraphCommand::Disconnect {
            parent,
            dock,
            child,
        } => {
            graph.connect(parent, dock, child)?;
            GraphCommand::Connect {
                parent,
                dock,
                child,
            }
        }
        &GraphCommand::MoveStack { root, dx, dy } => {
            graph.move_stack(root, -dx, -dy)?;
            GraphCommand::MoveStack {
                root,
                dx: -dx,
                dy: -dy,
            }
        }
        GraphCommand::Reshape {
            block,
            before,
            after,
            before_links,
            after_links,
        } => {
            graph.reshape_exact(*block, before.clone(), before_links)?;
            GraphCommand::Reshape {
                block: *block,
                before: after.clone(),
                after: before.clone(),
                before_links: after_links.clone(),
                after_links: before_links.clone(),
            }
        }
        &GraphCommand::ToggleCollapse { block } => {
            graph.toggle_collapse(block)?;
            GraphCommand::ToggleCollapse { block }
        }
        GraphCommand::Relabel { block, old, new } => {
            let outcome = graph.relabel(*block, old.clone())?;
            GraphCommand::Relabel {
                block: *block,
                old: new.clone(),
                new: outcome.value,
            }
        }
        &GraphCommand::Trash { root, parent } => {
            graph.restore_from_trash(root)?;
            if let Some((p, dock)) = parent {
                graph.connect(p, dock, root)?;
                graph.adjust_docks(p, true)?;
            }
            GraphCommand::Restore { root, parent }
        }
        &GraphCommand::Restore { root, .. } => {
            let parent = graph.send_to_trash(root)?;
            GraphCommand::Trash { root, parent }
        }
        GraphCommand::Batch(cmds) => {
            // Inverses are collected last-first, which is exactly the order
            // in which they must be replayed.
            let mut inverses = Vec::with_capacity(cmds.len());
            for c in cmds.iter().rev() {
                inverses.push(apply_inverse(graph, c)?);
            }
            GraphCommand::Batch(inverses)
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

fn downstream_links<S: ShapeGenerator, R: RenderAdapter>(
    graph: &BlockGraph<S, R>,
    id: BlockId,
) -> GraphResult<Vec<(usize, BlockId)>> {
    Ok(graph.block(id)?.children().collect())
}

/// Dock `child` into `parent[dock]` and seat it, returning the command for
/// undo.
pub fn connect<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    parent: BlockId,
    dock: usize,
    child: BlockId,
) -> GraphResult<GraphCommand> {
    let origin = graph.block(child)?.position();
    graph.connect(parent, dock, child)?;
    graph.adjust_docks(parent, true)?;
    let seated = graph.block(child)?.position();

    let mut cmds = vec![GraphCommand::Connect {
        parent,
        dock,
        child,
    }];
    let (dx, dy) = (seated.x - origin.x, seated.y - origin.y);
    if dx != 0.0 || dy != 0.0 {
        cmds.push(GraphCommand::MoveStack {
            root: child,
            dx,
            dy,
        });
    }
    Ok(GraphCommand::Batch(cmds))
}

/// Cut the link at `block[dock]`. The detached stack stays where it is.
///
/// Dock 0 cuts `block` away from the block above it.
pub fn disconnect<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
    dock: usize,
) -> GraphResult<GraphCommand> {
    let (parent, dock) = if dock == 0 {
        let Some(above) = graph.block(block)?.parent() else {
            return Ok(GraphCommand::Batch(Vec::new()));
        };
        let back = graph.block(above)?.dock_of(block).ok_or_else(|| {
            GraphError::InvariantViolation(format!("{} does not link back to {}", above, block))
        })?;
        (above, back)
    } else {
        (block, dock)
    };
    Ok(match graph.disconnect(parent, dock)? {
        Some(child) => GraphCommand::Disconnect {
            parent,
            dock,
            child,
        },
        None => GraphCommand::Batch(Vec::new()),
    })
}

/// Move a stack by a delta, returning the command for undo.
pub fn move_stack<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    root: BlockId,
    dx: f32,
    dy: f32,
) -> GraphResult<GraphCommand> {
    graph.move_stack(root, dx, dy)?;
    Ok(GraphCommand::MoveStack { root, dx, dy })
}

fn reshape_with<S, R, F>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
    change: F,
) -> GraphResult<GraphCommand>
where
    S: ShapeGenerator,
    R: RenderAdapter,
    F: FnOnce(&mut BlockGraph<S, R>) -> GraphResult<Vec<BlockId>>,
{
    let before = graph.block(block)?.configuration().clone();
    let before_links = downstream_links(graph, block)?;
    change(graph)?;
    let after = graph.block(block)?.configuration().clone();
    let after_links = downstream_links(graph, block)?;
    if before == after {
        return Ok(GraphCommand::Batch(Vec::new()));
    }
    Ok(GraphCommand::Reshape {
        block,
        before,
        after,
        before_links,
        after_links,
    })
}

/// Replace the argument slot counts of an argument clamp.
pub fn set_arg_slots<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
    counts: &[usize],
) -> GraphResult<GraphCommand> {
    reshape_with(graph, block, |g| g.apply_arg_slot_change(block, counts))
}

/// Grow or shrink one clamp body by one row.
pub fn clamp_body_delta<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
    body: usize,
    delta: i32,
) -> GraphResult<GraphCommand> {
    reshape_with(graph, block, |g| g.apply_clamp_body_delta(block, body, delta))
}

pub fn toggle_collapse<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
) -> GraphResult<GraphCommand> {
    graph.toggle_collapse(block)?;
    Ok(GraphCommand::ToggleCollapse { block })
}

pub fn relabel<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
    value: BlockValue,
) -> GraphResult<GraphCommand> {
    let outcome = graph.relabel(block, value)?;
    let old = outcome.previous.unwrap_or_else(|| outcome.value.clone());
    Ok(GraphCommand::Relabel {
        block,
        old,
        new: outcome.value,
    })
}

/// Send the stack at `root` to the trash.
pub fn trash<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    root: BlockId,
) -> GraphResult<GraphCommand> {
    if graph.block(root)?.is_trashed() {
        return Ok(GraphCommand::Batch(Vec::new()));
    }
    let parent = graph.send_to_trash(root)?;
    Ok(GraphCommand::Trash { root, parent })
}

/// Bring the trashed stack containing `block` back as a stack root.
pub fn restore<S: ShapeGenerator, R: RenderAdapter>(
    graph: &mut BlockGraph<S, R>,
    block: BlockId,
) -> GraphResult<GraphCommand> {
    if !graph.block(block)?.is_trashed() {
        return Ok(GraphCommand::Batch(Vec::new()));
    }
    let root = graph.restore_from_trash(block)?;
    Ok(GraphCommand::Restore { root, parent: None })
}
