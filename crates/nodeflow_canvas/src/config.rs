// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use egui::{vec2, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canvas settings shared by the store, coordinate system and interaction layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Side length of the square world, in world units
    pub world_size: f32,
    /// Smallest zoom factor
    pub min_scale: f32,
    /// Largest zoom factor
    pub max_scale: f32,
    /// Zoom change per wheel unit
    pub zoom_sensitivity: f32,
    /// Size used when the renderer has not reported one (e.g. on import)
    pub default_node_size: Vec2,
    /// Edge auto-pan while dragging nodes
    pub auto_pan: AutoPanConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            world_size: 100_000.0,
            min_scale: 0.1,
            max_scale: 4.0,
            zoom_sensitivity: 0.001,
            default_node_size: vec2(180.0, 80.0),
            auto_pan: AutoPanConfig::default(),
        }
    }
}

/// Auto-pan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPanConfig {
    /// Distance from the viewport edge (pixels) that triggers panning
    pub edge_margin: f32,
    /// Pan speed (pixels per step) with the pointer at the very edge
    pub max_speed: f32,
}

impl Default for AutoPanConfig {
    fn default() -> Self {
        Self {
            edge_margin: 50.0,
            max_speed: 15.0,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a RON config
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!("Loaded canvas config from {:?}", path);
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_size.is_finite() && self.world_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world_size must be positive, got {}",
                self.world_size
            )));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ConfigError::Invalid(format!(
                "scale range [{}, {}] is empty or non-positive",
                self.min_scale, self.max_scale
            )));
        }
        if self.auto_pan.edge_margin < 0.0 || self.auto_pan.max_speed < 0.0 {
            return Err(ConfigError::Invalid(
                "auto_pan margin and speed must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error loading a config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid RON
    #[error("Invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Parsed but out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world_size, 100_000.0);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = CanvasConfig::from_ron_str("(world_size: 5000.0, auto_pan: (max_speed: 30.0))")
            .unwrap();
        assert_eq!(config.world_size, 5000.0);
        assert_eq!(config.auto_pan.max_speed, 30.0);
        assert_eq!(config.auto_pan.edge_margin, 50.0);
        assert_eq!(config.max_scale, 4.0);
    }

    #[test]
    fn test_invalid_scale_range() {
        let result = CanvasConfig::from_ron_str("(min_scale: 2.0, max_scale: 1.0)");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
