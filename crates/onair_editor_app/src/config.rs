// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON next to the project. Missing files fall back to defaults;
//! values that would break the geometry math are rejected on load.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "onair_editor.ron";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Editor tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Virtual canvas width
    pub canvas_width: f64,
    /// Virtual canvas height
    pub canvas_height: f64,
    /// Display zoom of the virtual canvas, in `(0, 2]`
    pub canvas_scale: f64,
    /// Smallest width/height an interactive resize may produce
    pub min_object_size: f64,
    /// Virtual distance before a constrained drag locks an axis
    pub drag_lock_threshold: f64,
    /// Angle below which a constrained drag locks horizontally, in degrees
    pub drag_lock_angle: f64,
    /// Rotation snap step with the constrain modifier, in degrees
    pub rotation_snap: f64,
    /// Offset applied to pasted/duplicated objects
    pub paste_offset: f64,
    /// Arrow-key nudge distance
    pub nudge_step: f64,
    /// Arrow-key nudge distance with the constrain modifier
    pub nudge_step_large: f64,
    /// Gap kept below objects placed at the bottom of the canvas
    pub bottom_margin: f64,
    /// Undo depth
    pub history_depth: usize,
    /// Largest encoded snapshot history accepts, in bytes; unlimited when `None`
    pub history_snapshot_limit: Option<u64>,
    /// Timeline length of new objects, in seconds
    pub scene_duration: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            canvas_scale: 0.54,
            min_object_size: 10.0,
            drag_lock_threshold: 8.0,
            drag_lock_angle: 30.0,
            rotation_snap: 15.0,
            paste_offset: 10.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            bottom_margin: 20.0,
            history_depth: 50,
            history_snapshot_limit: None,
            scene_duration: 10.0,
        }
    }
}

impl EditorConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a RON document
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to `path` as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Pretty RON rendering
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canvas_scale > 0.0 && self.canvas_scale <= 2.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas_scale must be in (0, 2], got {}",
                self.canvas_scale
            )));
        }
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(ConfigError::Invalid("canvas size must be positive".to_string()));
        }
        if self.min_object_size <= 0.0 {
            return Err(ConfigError::Invalid("min_object_size must be positive".to_string()));
        }
        if self.rotation_snap <= 0.0 {
            return Err(ConfigError::Invalid("rotation_snap must be positive".to_string()));
        }
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid("history_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}
