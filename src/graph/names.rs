//! Value relabeling and named references.
//!
//! Actions and boxes are referred to by name. The name of an action is the
//! text block docked in its name socket; invoking blocks either carry the name
//! themselves (`NamedDo` and friends) or take a text block in their first
//! argument. Renaming the defining text block renames every reference.

use indexmap::IndexSet;

use super::BlockGraph;
use crate::arena::BlockId;
use crate::block::BlockValue;
use crate::dock::DockRole;
use crate::error::{GraphError, GraphResult};
use crate::kind::{BlockKind, ValueKind};
use crate::render::RenderAdapter;
use crate::shape::ShapeGenerator;

/// Outcome of [`BlockGraph::relabel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Relabel {
    pub block: BlockId,
    pub previous: Option<BlockValue>,
    /// Value actually stored, after coercion and name de-duplication.
    pub value: BlockValue,
    /// Other blocks whose value changed because they referenced the old name.
    pub renamed: Vec<BlockId>,
}

/// What a text block names by virtue of where it is docked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSite {
    Action,
    Box,
}

/// Convert `value` to what a block of `kind` can hold.
fn coerce(kind: BlockKind, value: BlockValue) -> Result<BlockValue, String> {
    let Some(value_kind) = kind.policy().value else {
        return Err(format!("{:?} blocks carry no value", kind));
    };
    match (value_kind, value) {
        (ValueKind::Number, BlockValue::Number(n)) if n.is_finite() => Ok(BlockValue::Number(n)),
        (ValueKind::Number, BlockValue::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(BlockValue::Number(n)),
            _ => Err(format!("{:?} is not a number", s)),
        },
        (ValueKind::Number, other) => Err(format!("{} is not a number", other)),
        (ValueKind::Boolean, BlockValue::Bool(b)) => Ok(BlockValue::Bool(b)),
        (ValueKind::Boolean, BlockValue::Text(s)) => match s.trim() {
            "true" => Ok(BlockValue::Bool(true)),
            "false" => Ok(BlockValue::Bool(false)),
            _ => Err(format!("{:?} is not a boolean", s)),
        },
        (ValueKind::Boolean, other) => Err(format!("{} is not a boolean", other)),
        (ValueKind::Text | ValueKind::Name, value) => {
            let text = value.to_string();
            Ok(BlockValue::Text(if text.is_empty() {
                "_".to_string()
            } else {
                text
            }))
        }
    }
}

/// First of `base`, `base1`, `base2`, ... not in `taken`.
fn unique_name(base: &str, taken: &IndexSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl<S: ShapeGenerator, R: RenderAdapter> BlockGraph<S, R> {
    /// Text of the block docked as the first argument of `id`, if it is a
    /// text block.
    fn name_argument(&self, id: BlockId) -> Option<(BlockId, String)> {
        let block = self.get(id)?;
        let dock = block
            .docks
            .iter()
            .position(|d| d.role == DockRole::Arg { index: 0 })?;
        let child = self.get(block.connection(dock)?)?;
        if child.kind != BlockKind::Text {
            return None;
        }
        let text = child.value.as_ref()?.as_text()?.to_string();
        Some((child.id, text))
    }

    fn name_site(&self, id: BlockId) -> Option<NameSite> {
        let block = self.get(id)?;
        if block.kind != BlockKind::Text {
            return None;
        }
        let parent = self.get(block.parent()?)?;
        let dock = parent.dock_of(id)?;
        if parent.docks[dock].role != (DockRole::Arg { index: 0 }) {
            return None;
        }
        match parent.kind {
            BlockKind::Action => Some(NameSite::Action),
            BlockKind::StoreIn => Some(NameSite::Box),
            _ => None,
        }
    }

    /// Names of every action in the graph, in arena order.
    pub fn action_names(&self) -> IndexSet<String> {
        self.iter()
            .filter(|b| b.kind == BlockKind::Action && !b.trash)
            .filter_map(|b| self.name_argument(b.id).map(|(_, name)| name))
            .collect()
    }

    /// Names of every box stored into or read from, in arena order.
    pub fn box_names(&self) -> IndexSet<String> {
        self.iter()
            .filter_map(|b| match b.kind {
                BlockKind::NamedBox => b.value.as_ref()?.as_text().map(str::to_string),
                BlockKind::Box | BlockKind::StoreIn => self.name_argument(b.id).map(|(_, n)| n),
                _ => None,
            })
            .collect()
    }

    /// Set the value of a value-carrying block.
    ///
    /// The value is coerced to the kind's payload type first; a value that
    /// cannot be coerced is rejected with `InvalidValue` and nothing changes.
    /// A text block naming an action is made unique among action names, and
    /// references to the old action or box name follow the rename.
    pub fn relabel(&mut self, id: BlockId, value: BlockValue) -> GraphResult<Relabel> {
        let block = self.block(id)?;
        let kind = block.kind;
        let previous = block.value.clone();
        let mut value = coerce(kind, value).map_err(|reason| {
            log::warn!("relabel of {} rejected: {}", id, reason);
            GraphError::InvalidValue { block: id, reason }
        })?;

        let site = self.name_site(id);
        if site == Some(NameSite::Action) {
            let taken: IndexSet<String> = self
                .iter()
                .filter(|b| b.kind == BlockKind::Action && !b.trash)
                .filter_map(|b| self.name_argument(b.id))
                .filter(|(name_block, _)| *name_block != id)
                .map(|(_, name)| name)
                .collect();
            value = BlockValue::Text(unique_name(&value.to_string(), &taken));
        }

        let old_name = previous
            .as_ref()
            .and_then(BlockValue::as_text)
            .map(str::to_string);
        let renamed = match (site, old_name, value.as_text()) {
            (Some(site), Some(old), Some(new)) if old != new => {
                let new = new.to_string();
                self.rename_references(id, site, &old, &new)?
            }
            _ => Vec::new(),
        };

        self.block_mut(id)?.value = Some(value.clone());
        self.notify_geometry(id);
        log::debug!("relabeled {} to {:?}, renamed {:?}", id, value, renamed);
        Ok(Relabel {
            block: id,
            previous,
            value,
            renamed,
        })
    }

    /// Replace `old` with `new` in every block referring to the named action
    /// or box. `definer` is the text block that was renamed.
    fn rename_references(
        &mut self,
        definer: BlockId,
        site: NameSite,
        old: &str,
        new: &str,
    ) -> GraphResult<Vec<BlockId>> {
        let mut targets = Vec::new();
        for block in self.iter() {
            let carries_name = match site {
                NameSite::Action => block.kind.is_named_invocation(),
                NameSite::Box => block.kind == BlockKind::NamedBox,
            };
            if carries_name && block.value.as_ref().and_then(BlockValue::as_text) == Some(old) {
                targets.push(block.id);
                continue;
            }
            let takes_name = match site {
                NameSite::Action => block.kind.invokes_action(),
                NameSite::Box => matches!(block.kind, BlockKind::Box | BlockKind::StoreIn),
            };
            if takes_name {
                if let Some((name_block, name)) = self.name_argument(block.id) {
                    if name_block != definer && name == old {
                        targets.push(name_block);
                    }
                }
            }
        }

        for &target in &targets {
            self.block_mut(target)?.value = Some(BlockValue::Text(new.to_string()));
            self.notify_geometry(target);
        }
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_accept_numeric_text() {
        assert_eq!(
            coerce(BlockKind::Number, BlockValue::Text(" 2.5 ".to_string())),
            Ok(BlockValue::Number(2.5))
        );
        assert!(coerce(BlockKind::Number, BlockValue::Text("two".to_string())).is_err());
        assert!(coerce(BlockKind::Number, BlockValue::Bool(true)).is_err());
    }

    #[test]
    fn test_booleans_accept_words() {
        assert_eq!(
            coerce(BlockKind::Boolean, BlockValue::Text("false".to_string())),
            Ok(BlockValue::Bool(false))
        );
        assert!(coerce(BlockKind::Boolean, BlockValue::Number(1.0)).is_err());
    }

    #[test]
    fn test_empty_text_becomes_placeholder() {
        assert_eq!(
            coerce(BlockKind::Text, BlockValue::Text(String::new())),
            Ok(BlockValue::Text("_".to_string()))
        );
        assert_eq!(
            coerce(BlockKind::Text, BlockValue::Number(3.0)),
            Ok(BlockValue::Text("3".to_string()))
        );
    }

    #[test]
    fn test_kinds_without_payload_reject() {
        assert!(coerce(BlockKind::Forward, BlockValue::Number(1.0)).is_err());
    }

    #[test]
    fn test_unique_name_appends_counter() {
        let taken: IndexSet<String> = ["action", "action1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_name("action", &taken), "action2");
        assert_eq!(unique_name("jump", &taken), "jump");
    }
}
