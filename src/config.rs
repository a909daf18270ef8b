// src/config.rs

use crate::error::{Error, Result};
use crate::interaction::ToolSettings;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings read from the optional TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial Clicks / Duration values, also used when a record lacks them
    pub tool_defaults: ToolSettings,
    pub overlay: OverlayConfig,
}

/// Geometry of the annotation overlay, in pixels of the source image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Radius of the soft halo around each point
    pub total_radius: f64,
    /// Radius of the opaque center
    pub solid_radius: f64,
    pub arrow_line_width: f64,
    pub arrowhead_length: f64,
    pub arrowhead_angle_deg: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            total_radius: 100.0,
            solid_radius: 25.0,
            arrow_line_width: 10.0,
            arrowhead_length: 80.0,
            arrowhead_angle_deg: 22.5,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(Error::io(path))?;
        let config = toml::from_str(&raw).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
