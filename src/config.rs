//! Runtime configuration loaded from TOML.
//!
//! Every key has a default, so a missing or empty file is valid. The core only
//! reads configuration; it never writes it back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::time::{self, Time};

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Initial overlay placement and gesture tuning (pixels)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_size: f32,
    /// Band along the edges that starts a resize instead of a drag
    pub grip_margin: f32,
    pub visible: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            x: 20.0,
            y: 20.0,
            width: 320.0,
            height: 180.0,
            min_size: 100.0,
            grip_margin: 10.0,
            visible: false,
        }
    }
}

/// Top-level settings for the sync engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Host tick and drift check period
    pub tick_interval_ms: u64,
    /// Drift tolerance before a corrective seek
    pub correction_threshold_ms: u64,
    /// Bound on how long a pipeline may take to acknowledge a load
    pub load_timeout_ms: u64,
    pub host_width: f32,
    pub host_height: f32,
    pub overlay: OverlayConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_interval_ms: 250,
            correction_threshold_ms: 100,
            load_timeout_ms: 5000,
            host_width: 1000.0,
            host_height: 600.0,
            overlay: OverlayConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Returns error if it doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::Invalid("load_timeout_ms must be positive".into()));
        }
        if !(self.host_width > 0.0 && self.host_height > 0.0) {
            return Err(ConfigError::Invalid("host size must be positive".into()));
        }
        let overlay = &self.overlay;
        if !(overlay.min_size > 0.0) {
            return Err(ConfigError::Invalid("overlay.min_size must be positive".into()));
        }
        if overlay.width < overlay.min_size || overlay.height < overlay.min_size {
            return Err(ConfigError::Invalid(format!(
                "overlay {}x{} is smaller than min_size {}",
                overlay.width, overlay.height, overlay.min_size
            )));
        }
        if !(overlay.grip_margin >= 0.0) {
            return Err(ConfigError::Invalid("overlay.grip_margin must not be negative".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Drift check period in nanoseconds
    pub fn drift_interval(&self) -> Time {
        time::from_millis(self.tick_interval_ms as i64)
    }

    /// Drift tolerance in nanoseconds
    pub fn correction_threshold(&self) -> Time {
        time::from_millis(self.correction_threshold_ms as i64)
    }

    pub fn host_size(&self) -> egui::Vec2 {
        egui::vec2(self.host_width, self.host_height)
    }
}
