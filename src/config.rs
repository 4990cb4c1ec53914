use serde::{Deserialize, Serialize};

use crate::animation::{DEFAULT_FPS, DEFAULT_HOLD_MS};
use crate::pointer::{PointerConfig, PointerTypes, ResetMode};
use crate::zoom::ZoomStrategy;

/// Manifest location used when the page does not provide one.
pub const DEFAULT_MANIFEST_PATH: &str = "images/images_umv.json";

/// Viewer settings, loaded from page JSON or a `viewer.toml` file.
///
/// Every field is optional in the source document and falls back to the
/// defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub manifest_path: String,
    /// Prefix joined to relative frame identifiers; empty keeps them page-relative
    pub base_url: String,
    pub fps: u32,
    /// Dwell on the final frame in milliseconds
    pub hold_ms: f64,
    pub zoom: ZoomStrategy,
    pub pointer_types: PointerTypes,
    pub end_on_leave: bool,
    pub reset: ResetMode,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            base_url: String::new(),
            fps: DEFAULT_FPS,
            hold_ms: DEFAULT_HOLD_MS,
            zoom: ZoomStrategy::default(),
            pointer_types: PointerTypes::default(),
            end_on_leave: false,
            reset: ResetMode::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(String),
    #[error("Playback rate must be at least 1 frame per second")]
    InvalidFps,
    #[error("Hold duration must be non-negative, got {0}")]
    InvalidHold(f64),
    #[error("Zoom factor must be positive, got {0}")]
    InvalidScale(f64),
    #[error("Zoom inset must be non-negative, got {0}")]
    InvalidInset(f64),
    #[error("Lens diameter must be positive, got {0}")]
    InvalidLensDiameter(f64),
}

impl ViewerConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a `viewer.toml` string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidFps);
        }
        if !(self.hold_ms >= 0.0) {
            return Err(ConfigError::InvalidHold(self.hold_ms));
        }
        match self.zoom {
            ZoomStrategy::ClampedOrigin { scale, inset } => {
                if !(scale > 0.0) {
                    return Err(ConfigError::InvalidScale(scale));
                }
                if !(inset >= 0.0) {
                    return Err(ConfigError::InvalidInset(inset));
                }
            }
            ZoomStrategy::FixedPoint { scale } => {
                if !(scale > 0.0) {
                    return Err(ConfigError::InvalidScale(scale));
                }
            }
            ZoomStrategy::Magnifier(lens) => {
                if !(lens.zoom > 0.0) {
                    return Err(ConfigError::InvalidScale(lens.zoom));
                }
                if !(lens.diameter > 0.0) {
                    return Err(ConfigError::InvalidLensDiameter(lens.diameter));
                }
            }
        }
        Ok(())
    }

    /// Settings for the pointer controller.
    pub fn pointer_config(&self) -> PointerConfig {
        PointerConfig {
            strategy: self.zoom,
            pointer_types: self.pointer_types,
            end_on_leave: self.end_on_leave,
            reset: self.reset,
        }
    }
}
