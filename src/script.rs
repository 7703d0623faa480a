//! JSON edit scripts and graph snapshots.
//!
//! An edit script is a JSON array of steps, each tagged with an `op` field.
//! Blocks are named by the script (`"name"` on `add`) and referred to by that
//! name afterwards. Rejected edits are recorded and the script carries on;
//! a fatal error or an unknown name stops it.
//!
//! ```json
//! [
//!   { "op": "add", "name": "loop", "kind": "repeat", "at": { "x": 0, "y": 0 } },
//!   { "op": "add", "name": "step", "kind": "forward" },
//!   { "op": "connect", "parent": "loop", "dock": 2, "child": "step" },
//!   { "op": "clamp_body", "block": "loop", "delta": 1 },
//!   { "op": "undo" }
//! ]
//! ```

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::arena::BlockId;
use crate::block::{BlockValue, Configuration, Geometry, Point};
use crate::config::GraphConfig;
use crate::dock::Dock;
use crate::error::GraphResult;
use crate::graph::{BlockGraph, DragGesture};
use crate::kind::BlockKind;
use crate::operations::{self, GraphCommand, GraphHistory};
use crate::render::{RenderEvent, RenderLog};
use crate::shape::StandardShapes;

/// A dock on a named block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DockRef {
    pub block: String,
    pub dock: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Add {
        name: String,
        kind: BlockKind,
        #[serde(default)]
        at: Point,
        #[serde(default)]
        value: Option<BlockValue>,
    },
    Connect {
        parent: String,
        dock: usize,
        child: String,
    },
    Disconnect {
        block: String,
        dock: usize,
    },
    Move {
        block: String,
        dx: f32,
        dy: f32,
    },
    /// A whole drag gesture. Drops on `onto` if given, otherwise on the
    /// nearest snap target when `snap` is set, otherwise on the canvas.
    Drag {
        block: String,
        dx: f32,
        dy: f32,
        #[serde(default)]
        onto: Option<DockRef>,
        #[serde(default)]
        snap: bool,
        #[serde(default)]
        cancel: bool,
    },
    ArgSlots {
        block: String,
        counts: Vec<usize>,
    },
    ClampBody {
        block: String,
        #[serde(default)]
        body: usize,
        delta: i32,
    },
    Toggle {
        block: String,
    },
    Relabel {
        block: String,
        value: BlockValue,
    },
    Trash {
        block: String,
    },
    Restore {
        block: String,
    },
    EmptyTrash,
    Undo,
    Redo,
}

/// Read an edit script from a JSON file.
pub fn load_script(path: &Utf8Path) -> Result<Vec<ScriptStep>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Parse script {}", path))
}

/// A step the graph refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub step: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSnapshot {
    pub name: String,
    pub id: BlockId,
    pub kind: BlockKind,
    pub configuration: Configuration,
    pub position: Point,
    pub geometry: Geometry,
    pub docks: Vec<Dock>,
    pub connections: Vec<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BlockValue>,
    pub collapsed: bool,
    pub visible: bool,
    pub trash: bool,
}

/// One-way JSON dump of a graph after a script run.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub blocks: Vec<BlockSnapshot>,
    pub roots: Vec<String>,
    pub rejected: Vec<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<RenderEvent>>,
}

/// Replays script steps against a graph with a recording renderer and an
/// undo history.
pub struct ScriptRunner {
    graph: BlockGraph<StandardShapes, RenderLog>,
    history: GraphHistory,
    names: IndexMap<String, BlockId>,
    rejected: Vec<Rejection>,
    steps: usize,
}

impl ScriptRunner {
    pub fn new(config: GraphConfig) -> Self {
        let shapes = StandardShapes::from_config(&config);
        let history = GraphHistory::new(config.history_depth);
        Self {
            graph: BlockGraph::with_config(shapes, RenderLog::new(), config),
            history,
            names: IndexMap::new(),
            rejected: Vec::new(),
            steps: 0,
        }
    }

    pub fn graph(&self) -> &BlockGraph<StandardShapes, RenderLog> {
        &self.graph
    }

    pub fn history(&self) -> &GraphHistory {
        &self.history
    }

    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Block registered under `name`.
    pub fn id(&self, name: &str) -> Result<BlockId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown block name {:?}", name))
    }

    fn name_of(&self, id: BlockId) -> String {
        self.names
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<()> {
        for step in steps {
            self.apply(step)?;
        }
        Ok(())
    }

    /// Apply one step. Recoverable graph errors are recorded as rejections;
    /// fatal ones and unknown names are returned.
    pub fn apply(&mut self, step: &ScriptStep) -> Result<()> {
        let index = self.steps;
        self.steps += 1;
        log::debug!("step {}: {:?}", index, step);

        let outcome = self.dispatch(step)?;
        match outcome {
            Ok(Some(cmd)) => self.history.push(cmd),
            Ok(None) => {}
            Err(e) if e.is_fatal() => {
                return Err(e).with_context(|| format!("Step {} failed", index));
            }
            Err(e) => {
                log::info!("step {} rejected: {}", index, e);
                self.rejected.push(Rejection {
                    step: index,
                    error: e.to_string(),
                });
            }
        }
        self.graph
            .check_invariants()
            .with_context(|| format!("Graph inconsistent after step {}", index))
    }

    /// Resolve names, then run the step against the graph.
    fn dispatch(&mut self, step: &ScriptStep) -> Result<GraphResult<Option<GraphCommand>>> {
        Ok(match step {
            ScriptStep::Add {
                name,
                kind,
                at,
                value,
            } => {
                if self.names.contains_key(name) {
                    bail!("Block name {:?} is used twice", name);
                }
                let added = match value {
                    Some(v) => self.graph.add_value_block(*kind, v.clone(), *at),
                    None => self.graph.add_block_at(*kind, *at),
                };
                added.map(|id| {
                    self.names.insert(name.clone(), id);
                    None
                })
            }
            ScriptStep::Connect {
                parent,
                dock,
                child,
            } => {
                let (parent, child) = (self.id(parent)?, self.id(child)?);
                operations::connect(&mut self.graph, parent, *dock, child).map(Some)
            }
            ScriptStep::Disconnect { block, dock } => {
                let block = self.id(block)?;
                operations::disconnect(&mut self.graph, block, *dock).map(Some)
            }
            ScriptStep::Move { block, dx, dy } => {
                let block = self.id(block)?;
                operations::move_stack(&mut self.graph, block, *dx, *dy).map(Some)
            }
            ScriptStep::Drag {
                block,
                dx,
                dy,
                onto,
                snap,
                cancel,
            } => {
                let block = self.id(block)?;
                let onto = match onto {
                    Some(r) => Some((self.id(&r.block)?, r.dock)),
                    None => None,
                };
                self.drag(block, *dx, *dy, onto, *snap, *cancel)
            }
            ScriptStep::ArgSlots { block, counts } => {
                let block = self.id(block)?;
                operations::set_arg_slots(&mut self.graph, block, counts).map(Some)
            }
            ScriptStep::ClampBody { block, body, delta } => {
                let block = self.id(block)?;
                operations::clamp_body_delta(&mut self.graph, block, *body, *delta).map(Some)
            }
            ScriptStep::Toggle { block } => {
                let block = self.id(block)?;
                operations::toggle_collapse(&mut self.graph, block).map(Some)
            }
            ScriptStep::Relabel { block, value } => {
                let block = self.id(block)?;
                operations::relabel(&mut self.graph, block, value.clone()).map(Some)
            }
            ScriptStep::Trash { block } => {
                let block = self.id(block)?;
                operations::trash(&mut self.graph, block).map(Some)
            }
            ScriptStep::Restore { block } => {
                let block = self.id(block)?;
                operations::restore(&mut self.graph, block).map(Some)
            }
            ScriptStep::EmptyTrash => {
                let removed = self.graph.empty_trash();
                if let Ok(removed) = &removed {
                    self.names.retain(|_, id| !removed.contains(id));
                    // Commands may refer to removed blocks.
                    self.history.clear();
                }
                removed.map(|_| None)
            }
            ScriptStep::Undo => self.history.undo(&mut self.graph).map(|_| None),
            ScriptStep::Redo => self.history.redo(&mut self.graph).map(|_| None),
        })
    }

    fn drag(
        &mut self,
        block: BlockId,
        dx: f32,
        dy: f32,
        onto: Option<(BlockId, usize)>,
        snap: bool,
        cancel: bool,
    ) -> GraphResult<Option<GraphCommand>> {
        let graph = &mut self.graph;
        let mut gesture = DragGesture::begin(graph, block)?;
        gesture.drag_by(graph, dx, dy)?;
        if cancel {
            gesture.cancel(graph)?;
            return Ok(None);
        }
        let target = match (onto, snap) {
            (Some(t), _) => Some(t),
            (None, true) => graph.find_snap_dock(block)?,
            (None, false) => None,
        };
        gesture.drop_on(graph, target).map(Some)
    }

    /// Dump the graph, the rejections and optionally the render events.
    pub fn snapshot(&self, with_events: bool) -> GraphSnapshot {
        let blocks = self
            .graph
            .iter()
            .map(|b| BlockSnapshot {
                name: self.name_of(b.id()),
                id: b.id(),
                kind: b.kind(),
                configuration: b.configuration().clone(),
                position: b.position(),
                geometry: b.geometry(),
                docks: b.docks().to_vec(),
                connections: b
                    .connections()
                    .iter()
                    .map(|c| c.map(|id| self.name_of(id)))
                    .collect(),
                value: b.value().cloned(),
                collapsed: b.is_collapsed(),
                visible: b.is_visible(),
                trash: b.is_trashed(),
            })
            .collect();
        GraphSnapshot {
            blocks,
            roots: self
                .graph
                .roots()
                .into_iter()
                .map(|id| self.name_of(id))
                .collect(),
            rejected: self.rejected.clone(),
            events: with_events.then(|| self.graph.renderer().events.clone()),
        }
    }
}
