//! Configuration changes: variable argument slots and clamp body rows.
//!
//! The shape generator owns every coordinate. This module only works out which
//! old dock index corresponds to which new one, disconnects whatever no longer
//! has a dock, and swaps docks, connections and geometry in one step.

use std::collections::HashMap;

use super::BlockGraph;
use crate::arena::BlockId;
use crate::block::Configuration;
use crate::dock::DockRole;
use crate::error::{GraphError, GraphResult};
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

/// Map old rows of one region to new rows when the region is resized.
///
/// Growing appends rows at the end. Shrinking drops empty rows first, latest
/// first, and only then occupied rows, again latest first. Surviving rows keep
/// their order and close up. Returns the new row for each old row, or `None`
/// if the row is dropped.
pub(crate) fn surviving_rows(occupied: &[bool], new_rows: usize) -> Vec<Option<usize>> {
    let old_rows = occupied.len();
    if new_rows >= old_rows {
        return (0..old_rows).map(Some).collect();
    }

    let mut drop = vec![false; old_rows];
    let mut excess = old_rows - new_rows;
    for pass_occupied in [false, true] {
        for row in (0..old_rows).rev() {
            if excess == 0 {
                break;
            }
            if !drop[row] && occupied[row] == pass_occupied {
                drop[row] = true;
                excess -= 1;
            }
        }
    }

    let mut next = 0;
    drop.into_iter()
        .map(|dropped| {
            if dropped {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    /// Replace the variable argument slot counts of an argument clamp.
    ///
    /// Returns the blocks that had to be disconnected because their slot was
    /// removed; they are left in place as stack roots.
    pub fn apply_arg_slot_change(
        &mut self,
        id: BlockId,
        new_counts: &[usize],
    ) -> GraphResult<Vec<BlockId>> {
        let kind = self.block(id)?.kind;
        if !kind.is_arg_clamp() {
            return Err(GraphError::InvalidResize {
                block: id,
                reason: format!("{:?} has no variable argument slots", kind),
            });
        }
        let config = Configuration {
            clamp_body_counts: new_counts.to_vec(),
            arg_slot_counts: new_counts.to_vec(),
        };
        self.reshape(id, config)
    }

    /// Grow or shrink one clamp body by a single row.
    ///
    /// For argument clamps each row is an argument socket, so the dock list
    /// changes; for flow clamps only the height does.
    pub fn apply_clamp_body_delta(
        &mut self,
        id: BlockId,
        body: usize,
        delta: i32,
    ) -> GraphResult<Vec<BlockId>> {
        let block = self.block(id)?;
        let invalid = |reason: String| GraphError::InvalidResize { block: id, reason };

        if delta != 1 && delta != -1 {
            return Err(invalid(format!("delta must be -1 or +1, got {}", delta)));
        }
        if !block.kind.is_clamp() {
            return Err(invalid(format!("{:?} has no clamp body", block.kind)));
        }

        let mut config = block.configuration.clone();
        let counts = &mut config.clamp_body_counts;
        let Some(rows) = counts.get(body).copied() else {
            return Err(invalid(format!(
                "{:?} has {} body region(s), not {}",
                block.kind,
                counts.len(),
                body + 1
            )));
        };
        if rows == 1 && delta < 0 {
            return Err(invalid(format!(
                "body {} is already at its minimum of one row",
                body
            )));
        }
        counts[body] = if delta > 0 { rows + 1 } else { rows - 1 };
        if block.kind.is_arg_clamp() {
            config.arg_slot_counts = config.clamp_body_counts.clone();
        }
        self.reshape(id, config)
    }

    fn reshape(&mut self, id: BlockId, config: Configuration) -> GraphResult<Vec<BlockId>> {
        let block = self.block(id)?;
        let kind = block.kind;
        kind.validate(&config)
            .map_err(|reason| GraphError::InvalidResize { block: id, reason })?;
        if block.configuration == config {
            return Ok(Vec::new());
        }
        let shaped = self.shape_docks(kind, &config)?;

        // Occupancy of each old slot region, in row order.
        let mut occupied: HashMap<usize, Vec<bool>> = HashMap::new();
        for (region, &rows) in block.configuration.arg_slot_counts.iter().enumerate() {
            occupied.insert(region, vec![false; rows]);
        }
        for (dock, _) in block.children() {
            if let DockRole::Slot { region, row } = block.docks[dock].role {
                if let Some(rows) = occupied.get_mut(&region) {
                    rows[row] = true;
                }
            }
        }
        let row_maps: HashMap<usize, Vec<Option<usize>>> = occupied
            .into_iter()
            .map(|(region, rows)| {
                let new_rows = config.arg_slot_counts.get(region).copied().unwrap_or(0);
                (region, surviving_rows(&rows, new_rows))
            })
            .collect();

        let new_index: HashMap<DockRole, usize> = shaped
            .docks
            .iter()
            .enumerate()
            .map(|(i, d)| (d.role, i))
            .collect();

        let mut connections = vec![None; shaped.docks.len()];
        connections[0] = block.connections[0];
        let mut dropped = Vec::new();
        for (dock, child) in block.children() {
            let role = match block.docks[dock].role {
                DockRole::Slot { region, row } => row_maps
                    .get(&region)
                    .and_then(|m| m[row])
                    .map(|row| DockRole::Slot { region, row }),
                role => Some(role),
            };
            match role.and_then(|r| new_index.get(&r)) {
                Some(&i) => connections[i] = Some(child),
                None => dropped.push(dock),
            }
        }
        if connections.len() != shaped.docks.len() {
            let msg = format!("remapping {} produced mismatched dock and connection lists", id);
            log::error!("{}", msg);
            return Err(GraphError::InvariantViolation(msg));
        }

        let mut detached = Vec::with_capacity(dropped.len());
        for dock in dropped {
            if let Some(child) = self.disconnect(id, dock)? {
                detached.push(child);
            }
        }

        log::debug!(
            "reshaped {} {:?}: {:?} -> {:?}, {} dock(s), detached {:?}",
            id,
            kind,
            self.block(id)?.configuration,
            config,
            shaped.docks.len(),
            detached
        );

        let block = self.block_mut(id)?;
        block.configuration = config;
        block.docks = shaped.docks;
        block.connections = connections;
        block.geometry = shaped.geometry;
        block.outline = shaped.outline;
        self.notify_geometry(id);

        self.seat_on_parent(id)?;
        self.adjust_docks(id, true)?;
        Ok(detached)
    }

    /// Set an exact configuration and exact set of downstream links.
    ///
    /// Used to reverse a resize: every link target must currently be a stack
    /// root or a child of `id`.
    pub(crate) fn reshape_exact(
        &mut self,
        id: BlockId,
        config: Configuration,
        links: &[(usize, BlockId)],
    ) -> GraphResult<()> {
        let block = self.block(id)?;
        let kind = block.kind;
        kind.validate(&config)
            .map_err(|reason| GraphError::InvalidResize { block: id, reason })?;
        let shaped = self.shape_docks(kind, &config)?;
        let ancestors = self.ancestors(id)?;

        let mut seen_docks = Vec::new();
        for &(dock, child) in links {
            let target = self.block(child)?;
            let socket = shaped
                .docks
                .get(dock)
                .filter(|_| dock > 0)
                .ok_or(GraphError::NoSuchDock { block: id, dock })?;
            if seen_docks.contains(&dock) {
                return Err(GraphError::SlotOccupied { block: id, dock });
            }
            seen_docks.push(dock);
            if child == id || ancestors.contains(&child) {
                return Err(GraphError::Cycle { parent: id, child });
            }
            if target.parent().is_some_and(|p| p != id) {
                return Err(GraphError::SlotOccupied {
                    block: child,
                    dock: 0,
                });
            }
            if !socket.tag.is_compatible(target.docks[0].tag) {
                return Err(GraphError::IncompatibleDock {
                    block: id,
                    dock,
                    found: socket.tag,
                    offered: target.docks[0].tag,
                });
            }
        }

        let current: Vec<usize> = block.children().map(|(i, _)| i).collect();
        for dock in current {
            self.disconnect(id, dock)?;
        }

        let block = self.block_mut(id)?;
        let parent = block.parent();
        block.configuration = config;
        block.connections = vec![None; shaped.docks.len()];
        block.connections[0] = parent;
        block.docks = shaped.docks;
        block.geometry = shaped.geometry;
        block.outline = shaped.outline;
        self.notify_geometry(id);

        for &(dock, child) in links {
            self.connect(id, dock, child)?;
        }
        self.seat_on_parent(id)?;
        self.adjust_docks(id, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growing_keeps_rows() {
        assert_eq!(
            surviving_rows(&[true, false], 4),
            vec![Some(0), Some(1)]
        );
    }

    #[test]
    fn test_shrinking_drops_empty_rows_first() {
        // Row 2 is occupied, rows 1 and 3 are empty: drop 3, then 1.
        assert_eq!(
            surviving_rows(&[true, false, true, false], 2),
            vec![Some(0), None, Some(1), None]
        );
    }

    #[test]
    fn test_shrinking_drops_latest_occupied_when_needed() {
        assert_eq!(
            surviving_rows(&[true, true, false], 1),
            vec![Some(0), None, None]
        );
    }

    #[test]
    fn test_shrinking_all_empty_drops_from_end() {
        assert_eq!(
            surviving_rows(&[false, false, false], 2),
            vec![Some(0), Some(1), None]
        );
    }
}
