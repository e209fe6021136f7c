//! Grid configuration supplied by the integrating layer.
//!
//! Width, height and weight capacity are fixed at construction; resizing and
//! capacity changes go through explicit calls on the inventory afterwards.
//!
//! ```
//! use satchel_logic::config::{validate_config, GridConfig};
//!
//! let mut config = GridConfig::default();
//! config.width = 8;
//! config.weight_capacity = 35.0;
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// Largest accepted side length. Keeps `width × height` well inside `u32`.
pub const MAX_GRID_SIDE: u32 = 1024;

/// Construction parameters for one inventory grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Maximum total weight of everything on the grid.
    pub weight_capacity: f64,
    /// When a drag is released over an invalid spot, try first fit before
    /// putting the item back.
    pub auto_arrange_on_drop: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 6,
            weight_capacity: 50.0,
            auto_arrange_on_drop: false,
        }
    }
}

impl GridConfig {
    pub fn new(width: u32, height: u32, weight_capacity: f64) -> Self {
        Self {
            width,
            height,
            weight_capacity,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid width must be at least 1")]
    ZeroWidth,
    #[error("grid height must be at least 1")]
    ZeroHeight,
    #[error("grid {0}×{1} exceeds the maximum side of {MAX_GRID_SIDE}")]
    GridTooLarge(u32, u32),
    #[error("weight capacity {0} must be finite and non-negative")]
    InvalidCapacity(f64),
}

/// Validate a grid configuration, returning all errors found.
pub fn validate_config(config: &GridConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.width == 0 {
        errors.push(ConfigError::ZeroWidth);
    }
    if config.height == 0 {
        errors.push(ConfigError::ZeroHeight);
    }
    if config.width > MAX_GRID_SIDE || config.height > MAX_GRID_SIDE {
        errors.push(ConfigError::GridTooLarge(config.width, config.height));
    }
    if !config.weight_capacity.is_finite() || config.weight_capacity < 0.0 {
        errors.push(ConfigError::InvalidCapacity(config.weight_capacity));
    }

    errors
}
