//! Shape generation: the geometry oracle the graph consults on every
//! configuration change.
//!
//! The graph never does layout math itself. It hands a kind and a
//! configuration to a [`ShapeGenerator`] and copies the answer.

use crate::block::{Configuration, Point};
use crate::config::GraphConfig;
use crate::dock::{DockRole, DockTag};
use crate::kind::{BlockKind, Family};

/// Output of a shape generator for one kind + configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Opaque outline descriptor (an SVG path for [`StandardShapes`]).
    pub outline: String,
    /// One offset per dock, in the kind's dock order.
    pub dock_offsets: Vec<Point>,
    pub width: f32,
    pub height: f32,
    pub hit_height: f32,
}

/// Pure, deterministic shape oracle.
pub trait ShapeGenerator {
    fn generate(&self, kind: BlockKind, config: &Configuration) -> Shape;
}

impl<G: ShapeGenerator + ?Sized> ShapeGenerator for &G {
    fn generate(&self, kind: BlockKind, config: &Configuration) -> Shape {
        (**self).generate(kind, config)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StandardShapes
// ────────────────────────────────────────────────────────────────────────────

const WIDTH: f32 = 100.0;
const ROW: f32 = 42.0;
const NOTCH_X: f32 = 20.0;
const BODY_INSET: f32 = 20.0;
const ARM: f32 = 21.0;
/// Extra width per slot row beyond the first in an argument clamp.
const SLOT_WIDEN: f32 = 8.0;

/// Reference generator with fixed row-based layout.
///
/// Reporters plug in on their left edge, statements at a notch on their top
/// edge; argument sockets sit on the right edge one row apart, and clamp
/// bodies open below the header, indented by a fixed inset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardShapes {
    pub scale: f32,
}

impl Default for StandardShapes {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl StandardShapes {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.scale)
    }

    /// Height of one row at the current scale.
    pub fn row_height(&self) -> f32 {
        ROW * self.scale
    }
}

struct Layout {
    width: f32,
    header: f32,
    /// Top of each body/slot region.
    region_tops: Vec<f32>,
    height: f32,
}

impl StandardShapes {
    fn layout(&self, kind: BlockKind, config: &Configuration) -> Layout {
        let s = self.scale;
        let policy = kind.policy();
        let header = ROW * s * policy.args.len().max(1) as f32;

        let regions: &[usize] = match policy.family {
            Family::ArgClamp => &config.arg_slot_counts,
            Family::Clamp | Family::DoubleClamp => &config.clamp_body_counts,
            _ => &[],
        };

        let mut y = header;
        let mut region_tops = Vec::with_capacity(regions.len());
        for &rows in regions {
            region_tops.push(y);
            y += ROW * s * rows as f32 + ARM * s;
        }

        let total_rows: usize = config.arg_slot_counts.iter().sum();
        let widen = SLOT_WIDEN * s * total_rows.saturating_sub(1) as f32;

        Layout {
            width: WIDTH * s + widen,
            header,
            region_tops,
            height: y,
        }
    }

    fn outline(&self, layout: &Layout, kind: BlockKind, config: &Configuration) -> String {
        let s = self.scale;
        let mouth_x = (NOTCH_X + BODY_INSET) * s;
        let w = layout.width;
        let mut path = format!("M0,0 H{w} V{}", layout.header);
        let counts: &[usize] = if kind.is_arg_clamp() {
            &config.arg_slot_counts
        } else {
            &config.clamp_body_counts
        };
        for (&top, &rows) in layout.region_tops.iter().zip(counts) {
            let bottom = top + ROW * s * rows as f32;
            path.push_str(&format!(
                " H{mouth_x} V{bottom} H{w} V{}",
                bottom + ARM * s
            ));
        }
        path.push_str(&format!(" V{} H0 Z", layout.height));
        path
    }
}

impl ShapeGenerator for StandardShapes {
    fn generate(&self, kind: BlockKind, config: &Configuration) -> Shape {
        let s = self.scale;
        let layout = self.layout(kind, config);
        let half = ROW * s / 2.0;

        let dock_offsets = kind
            .dock_template(config)
            .into_iter()
            .map(|(role, tag)| match role {
                DockRole::Upstream => match tag {
                    DockTag::FlowOut | DockTag::Unavailable => Point::new(NOTCH_X * s, 0.0),
                    _ => Point::new(0.0, half),
                },
                DockRole::Arg { index } => {
                    Point::new(layout.width, half + ROW * s * index as f32)
                }
                DockRole::Body { index } => {
                    Point::new((NOTCH_X + BODY_INSET) * s, layout.region_tops[index])
                }
                DockRole::Slot { region, row } => Point::new(
                    (NOTCH_X + BODY_INSET) * s,
                    layout.region_tops[region] + half + ROW * s * row as f32,
                ),
                DockRole::Next => Point::new(NOTCH_X * s, layout.height),
            })
            .collect();

        let hit_height = if kind.is_clamp() {
            layout.header
        } else {
            layout.height
        };

        Shape {
            outline: self.outline(&layout, kind, config),
            dock_offsets,
            width: layout.width,
            height: layout.height,
            hit_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dock_count_matches_template() {
        let shapes = StandardShapes::default();
        for &kind in BlockKind::ALL {
            let config = kind.default_configuration();
            let shape = shapes.generate(kind, &config);
            assert_eq!(
                shape.dock_offsets.len(),
                kind.dock_template(&config).len(),
                "{:?}",
                kind
            );
        }
    }

    #[test]
    fn test_clamp_grows_with_body_rows() {
        let shapes = StandardShapes::default();
        let one = shapes.generate(BlockKind::Repeat, &BlockKind::Repeat.default_configuration());
        let three = shapes.generate(
            BlockKind::Repeat,
            &Configuration {
                clamp_body_counts: vec![3],
                arg_slot_counts: vec![],
            },
        );
        assert_eq!(three.height - one.height, 2.0 * ROW);
        assert_eq!(three.hit_height, one.hit_height);
        assert_eq!(three.width, one.width);
        // The next-statement socket follows the bottom edge.
        assert_eq!(three.dock_offsets[3].y, three.height);
    }

    #[test]
    fn test_arg_clamp_widens_per_row() {
        let shapes = StandardShapes::default();
        let config = |n| Configuration {
            clamp_body_counts: vec![n],
            arg_slot_counts: vec![n],
        };
        let one = shapes.generate(BlockKind::NamedDoArg, &config(1));
        let three = shapes.generate(BlockKind::NamedDoArg, &config(3));
        assert_eq!(three.width - one.width, 2.0 * SLOT_WIDEN);
        assert_eq!(three.dock_offsets.len(), one.dock_offsets.len() + 2);
    }

    #[test]
    fn test_scale_applies_to_every_offset() {
        let kind = BlockKind::IfThenElse;
        let config = kind.default_configuration();
        let base = StandardShapes::new(1.0).generate(kind, &config);
        let double = StandardShapes::new(2.0).generate(kind, &config);
        assert_eq!(double.height, base.height * 2.0);
        for (a, b) in base.dock_offsets.iter().zip(&double.dock_offsets) {
            assert_eq!(b.x, a.x * 2.0);
            assert_eq!(b.y, a.y * 2.0);
        }
    }
}
