//! Closed set of block kinds and their per-kind policy table.
//!
//! Everything that varies by kind (dock template, clamp bodies, variable slot
//! regions, collapsibility, value payload) is answered by [`BlockKind::policy`],
//! so adding a kind is a compile-checked change in one place.

use serde::{Deserialize, Serialize};

use crate::block::{BlockValue, Configuration};
use crate::dock::{DockRole, DockTag};

/// Shape family, which selects the layout math and the resize behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Leaf reporter carrying a literal value.
    Value,
    /// Reporter with fixed arguments.
    Arg,
    /// Two-operand reporter (arithmetic or comparison).
    TwoArg,
    /// Statement with fixed arguments and a following statement.
    Flow,
    /// Statement with one body region.
    Clamp,
    /// Statement with two body regions ("if-then-else").
    DoubleClamp,
    /// Block whose body is a variable list of argument rows.
    ArgClamp,
}

/// What kind of literal a block holds, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    /// Name of an action or box, shared with every block that refers to it.
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Number,
    Text,
    Boolean,
    Media,
    NamedBox,
    Box,
    Plus,
    Minus,
    Equal,
    Greater,
    Less,
    Forward,
    Print,
    StoreIn,
    Do,
    NamedDo,
    Repeat,
    Forever,
    If,
    IfThenElse,
    /// Foldable statement group. No next dock, so it ends a sequence.
    Group,
    Start,
    Action,
    CalcArg,
    DoArg,
    NamedCalcArg,
    NamedDoArg,
}

/// Static description of one kind.
#[derive(Debug, Clone, Copy)]
pub struct KindPolicy {
    pub family: Family,
    /// Connector offered to the parent.
    pub upstream: DockTag,
    /// Fixed argument sockets, in dock order.
    pub args: &'static [DockTag],
    /// Number of clamp bodies (flow clamps only).
    pub bodies: usize,
    /// Number of variable argument regions (arg clamps only).
    pub slot_regions: usize,
    pub has_next: bool,
    pub collapsible: bool,
    pub value: Option<ValueKind>,
    /// Upper bound for any body or slot row count.
    pub max_rows: usize,
}

const MAX_ROWS: usize = 64;

const fn policy(family: Family, upstream: DockTag, args: &'static [DockTag]) -> KindPolicy {
    KindPolicy {
        family,
        upstream,
        args,
        bodies: 0,
        slot_regions: 0,
        has_next: false,
        collapsible: false,
        value: None,
        max_rows: MAX_ROWS,
    }
}

const fn value(upstream: DockTag, kind: ValueKind) -> KindPolicy {
    KindPolicy {
        value: Some(kind),
        ..policy(Family::Value, upstream, &[])
    }
}

const fn statement(args: &'static [DockTag]) -> KindPolicy {
    KindPolicy {
        has_next: true,
        ..policy(Family::Flow, DockTag::FlowOut, args)
    }
}

const fn clamp(upstream: DockTag, args: &'static [DockTag], has_next: bool) -> KindPolicy {
    KindPolicy {
        bodies: 1,
        has_next,
        ..policy(Family::Clamp, upstream, args)
    }
}

const fn arg_clamp(upstream: DockTag, args: &'static [DockTag], has_next: bool) -> KindPolicy {
    KindPolicy {
        slot_regions: 1,
        has_next,
        ..policy(Family::ArgClamp, upstream, args)
    }
}

use DockTag::{AnyOut, BooleanIn, BooleanOut, FlowOut, NumberIn, NumberOut, TextIn};

const NUMBER_PAIR: &[DockTag] = &[NumberIn, NumberIn];
const NAME_ONLY: &[DockTag] = &[TextIn];

impl BlockKind {
    pub const ALL: &'static [BlockKind] = &[
        BlockKind::Number,
        BlockKind::Text,
        BlockKind::Boolean,
        BlockKind::Media,
        BlockKind::NamedBox,
        BlockKind::Box,
        BlockKind::Plus,
        BlockKind::Minus,
        BlockKind::Equal,
        BlockKind::Greater,
        BlockKind::Less,
        BlockKind::Forward,
        BlockKind::Print,
        BlockKind::StoreIn,
        BlockKind::Do,
        BlockKind::NamedDo,
        BlockKind::Repeat,
        BlockKind::Forever,
        BlockKind::If,
        BlockKind::IfThenElse,
        BlockKind::Group,
        BlockKind::Start,
        BlockKind::Action,
        BlockKind::CalcArg,
        BlockKind::DoArg,
        BlockKind::NamedCalcArg,
        BlockKind::NamedDoArg,
    ];

    pub fn policy(self) -> KindPolicy {
        match self {
            BlockKind::Number => value(NumberOut, ValueKind::Number),
            BlockKind::Text => value(DockTag::TextOut, ValueKind::Text),
            BlockKind::Boolean => value(BooleanOut, ValueKind::Boolean),
            BlockKind::Media => value(DockTag::MediaOut, ValueKind::Text),
            BlockKind::NamedBox => KindPolicy {
                value: Some(ValueKind::Name),
                ..policy(Family::Arg, AnyOut, &[])
            },
            BlockKind::Box => policy(Family::Arg, AnyOut, NAME_ONLY),
            BlockKind::Plus | BlockKind::Minus => policy(Family::TwoArg, NumberOut, NUMBER_PAIR),
            BlockKind::Equal | BlockKind::Greater | BlockKind::Less => {
                policy(Family::TwoArg, BooleanOut, NUMBER_PAIR)
            }
            BlockKind::Forward => statement(&[NumberIn]),
            BlockKind::Print => statement(&[DockTag::AnyIn]),
            BlockKind::StoreIn => statement(&[TextIn, DockTag::AnyIn]),
            BlockKind::Do => statement(NAME_ONLY),
            BlockKind::NamedDo => KindPolicy {
                value: Some(ValueKind::Name),
                ..statement(&[])
            },
            BlockKind::Repeat => clamp(FlowOut, &[NumberIn], true),
            BlockKind::Forever => clamp(FlowOut, &[], true),
            BlockKind::If => clamp(FlowOut, &[BooleanIn], true),
            BlockKind::IfThenElse => KindPolicy {
                family: Family::DoubleClamp,
                bodies: 2,
                ..clamp(FlowOut, &[BooleanIn], true)
            },
            BlockKind::Group => KindPolicy {
                collapsible: true,
                ..clamp(FlowOut, &[], false)
            },
            BlockKind::Start => KindPolicy {
                collapsible: true,
                ..clamp(DockTag::Unavailable, &[], false)
            },
            BlockKind::Action => KindPolicy {
                collapsible: true,
                ..clamp(DockTag::Unavailable, NAME_ONLY, false)
            },
            BlockKind::CalcArg => arg_clamp(AnyOut, NAME_ONLY, false),
            BlockKind::DoArg => arg_clamp(FlowOut, NAME_ONLY, true),
            BlockKind::NamedCalcArg => KindPolicy {
                value: Some(ValueKind::Name),
                ..arg_clamp(AnyOut, &[], false)
            },
            BlockKind::NamedDoArg => KindPolicy {
                value: Some(ValueKind::Name),
                ..arg_clamp(FlowOut, &[], true)
            },
        }
    }

    pub fn family(self) -> Family {
        self.policy().family
    }

    pub fn is_collapsible(self) -> bool {
        self.policy().collapsible
    }

    pub fn is_clamp(self) -> bool {
        matches!(
            self.family(),
            Family::Clamp | Family::DoubleClamp | Family::ArgClamp
        )
    }

    pub fn is_arg_clamp(self) -> bool {
        self.family() == Family::ArgClamp
    }

    /// Blocks that invoke a named action (renamed along with the action).
    pub fn invokes_action(self) -> bool {
        matches!(
            self,
            BlockKind::Do | BlockKind::DoArg | BlockKind::CalcArg
        )
    }

    /// Blocks that carry an action name in their own value.
    pub fn is_named_invocation(self) -> bool {
        matches!(
            self,
            BlockKind::NamedDo | BlockKind::NamedDoArg | BlockKind::NamedCalcArg
        )
    }

    pub fn default_configuration(self) -> Configuration {
        let p = self.policy();
        let slots = vec![1; p.slot_regions];
        Configuration {
            clamp_body_counts: if p.slot_regions > 0 {
                slots.clone()
            } else {
                vec![1; p.bodies]
            },
            arg_slot_counts: slots,
        }
    }

    pub fn default_value(self) -> Option<BlockValue> {
        match self.policy().value? {
            ValueKind::Number => Some(BlockValue::Number(0.0)),
            ValueKind::Boolean => Some(BlockValue::Bool(true)),
            ValueKind::Text => Some(BlockValue::Text(String::new())),
            ValueKind::Name => Some(BlockValue::Text(match self {
                BlockKind::NamedBox => "box".to_string(),
                _ => "action".to_string(),
            })),
        }
    }

    /// Check a configuration against this kind's region counts and row bounds.
    pub fn validate(self, config: &Configuration) -> Result<(), String> {
        let p = self.policy();
        let check_rows = |what: &str, counts: &[usize], expected: usize| {
            if counts.len() != expected {
                return Err(format!(
                    "{:?} expects {} {} region(s), got {}",
                    self,
                    expected,
                    what,
                    counts.len()
                ));
            }
            match counts.iter().position(|&c| c < 1 || c > p.max_rows) {
                Some(i) => Err(format!(
                    "{} region {} must hold between 1 and {} rows, got {}",
                    what, i, p.max_rows, counts[i]
                )),
                None => Ok(()),
            }
        };

        if p.slot_regions > 0 {
            check_rows("slot", &config.arg_slot_counts, p.slot_regions)?;
            if config.clamp_body_counts != config.arg_slot_counts {
                return Err("argument region and clamp body counts disagree".to_string());
            }
            Ok(())
        } else {
            check_rows("slot", &config.arg_slot_counts, 0)?;
            check_rows("body", &config.clamp_body_counts, p.bodies)
        }
    }

    /// Dock roles and types for a configuration, in dock order.
    pub fn dock_template(self, config: &Configuration) -> Vec<(DockRole, DockTag)> {
        let p = self.policy();
        let mut docks = vec![(DockRole::Upstream, p.upstream)];
        for (index, &tag) in p.args.iter().enumerate() {
            docks.push((DockRole::Arg { index }, tag));
        }
        for index in 0..p.bodies {
            docks.push((DockRole::Body { index }, DockTag::FlowIn));
        }
        for (region, &rows) in config.arg_slot_counts.iter().enumerate() {
            for row in 0..rows {
                docks.push((DockRole::Slot { region, row }, DockTag::AnyIn));
            }
        }
        if p.has_next {
            docks.push((DockRole::Next, DockTag::FlowIn));
        }
        docks
    }
}
