//! CLI commands for the files found trigger.

pub mod agent;
pub mod check;
pub mod migrate;
pub mod nodes;
pub mod run;

use anyhow::{Context, Result};
use filesfound::Settings;
use filesfound_protocol::default_config_path;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn settings_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(default_config_path)
}

/// Load the settings file, which must exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| {
        format!(
            "Failed to load settings from {}. Pass --config or set FILESFOUND_CONFIG.",
            path.display()
        )
    })
}

/// Load the settings file if present, otherwise start from empty settings.
pub fn load_settings_or_default(path: &Path) -> Result<Settings> {
    if path.exists() {
        load_settings(path)
    } else {
        debug!(path = %path.display(), "No settings file, using defaults");
        Ok(Settings::default())
    }
}
