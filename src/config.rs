//! Tunables for the graph, its shapes and its history.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Block scale handed to the standard shape generator.
    pub scale: f32,
    /// Maximum distance between a dragged block's upstream dock and a target
    /// dock for the drop to snap.
    pub snap_radius: f32,
    /// Maximum undo depth.
    pub history_depth: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            snap_radius: 40.0,
            history_depth: 200,
        }
    }
}

impl GraphConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
        let config: GraphConfig =
            serde_json::from_str(&text).with_context(|| format!("Parse config {}", path))?;
        if !(config.scale.is_finite() && config.scale > 0.0) {
            anyhow::bail!("scale must be positive, got {}", config.scale);
        }
        if config.snap_radius.is_nan() || config.snap_radius < 0.0 {
            anyhow::bail!("snap_radius must not be negative, got {}", config.snap_radius);
        }
        Ok(config)
    }
}
