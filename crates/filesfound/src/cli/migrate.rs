//! `migrate`: rewrite the settings file in the current trigger format.

use super::load_settings;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

pub fn run(config: &Path) -> Result<ExitCode> {
    let settings = load_settings(config)?;
    let migrated = settings.migrated().context("Invalid settings")?;
    if migrated == settings {
        println!("{} is already current", config.display());
        return Ok(ExitCode::SUCCESS);
    }

    migrated
        .save(config)
        .with_context(|| format!("Failed to write {}", config.display()))?;
    info!(path = %config.display(), "Settings migrated");
    println!("Migrated {}", config.display());
    Ok(ExitCode::SUCCESS)
}
