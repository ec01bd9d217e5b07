//! Application configuration
//!
//! Shared types live in eqlog-types; this module adds platform defaults and
//! persistence through confy.

use std::path::PathBuf;

pub use eqlog_types::{AppConfig, OverlaySettings};

use super::error::ConfigError;

const APP_NAME: &str = "eqlog";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Defaults
// ─────────────────────────────────────────────────────────────────────────────

fn default_data_directory() -> String {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence
pub trait AppConfigExt {
    fn load() -> Self;
    fn load_with_defaults() -> Self;
    fn save(&self) -> Result<(), ConfigError>;
    /// Directory holding the spell and pet name tables
    fn reference_dir(&self) -> PathBuf;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        match confy::load::<AppConfig>(APP_NAME, CONFIG_NAME) {
            Ok(config) if !config.data_directory.is_empty() => config,
            Ok(config) => AppConfig {
                data_directory: default_data_directory(),
                ..config
            },
            Err(e) => {
                tracing::warn!(error = %ConfigError::from(e), "Using default configuration");
                Self::load_with_defaults()
            }
        }
    }

    /// Load with platform-specific defaults (used when no config file exists)
    fn load_with_defaults() -> Self {
        AppConfig::with_data_directory(default_data_directory())
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn reference_dir(&self) -> PathBuf {
        if self.data_directory.is_empty() {
            PathBuf::from(default_data_directory())
        } else {
            PathBuf::from(&self.data_directory)
        }
    }
}
