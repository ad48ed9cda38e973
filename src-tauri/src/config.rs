//! User settings, persisted as JSON in the platform config directory:
//!   macOS:   ~/Library/Application Support/realtime-histogram/config.json
//!   Linux:   ~/.config/realtime-histogram/config.json
//!   Windows: %APPDATA%/realtime-histogram/config.json

use crate::capture::CaptureMode;
use crate::preview::PreviewFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fastest pacing the loop will accept.
pub const MIN_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub capture_mode: CaptureMode,
    /// Sleep between loop iterations.
    pub interval_ms: u64,
    /// Fixed chart y-axis ceiling; 0 lets the chart scale itself.
    pub scale_y: u32,
    pub preview_format: PreviewFormat,
    /// Live results closer together than this are dropped.
    pub min_publish_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::Window,
            interval_ms: 100,
            scale_y: 0,
            preview_format: PreviewFormat::Png,
            min_publish_interval_ms: 50,
        }
    }
}

impl AppConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn min_publish_interval(&self) -> Duration {
        Duration::from_millis(self.min_publish_interval_ms)
    }
}

/// Base directory for settings.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("realtime-histogram"))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// Loads settings, falling back to defaults on any problem.
pub fn load_config() -> AppConfig {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            log::warn!("[CONFIG] No config directory on this platform, using defaults");
            AppConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        log::info!("[CONFIG] No config at {}, using defaults", path.display());
        return AppConfig::default();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(ConfigError::from)
        .and_then(|contents| serde_json::from_str::<AppConfig>(&contents).map_err(ConfigError::from));

    match parsed {
        Ok(config) => {
            log::info!("[CONFIG] Loaded {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("[CONFIG] {}, using defaults", e);
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_config_to(config, &path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    log::debug!("[CONFIG] Saved {}", path.display());
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
