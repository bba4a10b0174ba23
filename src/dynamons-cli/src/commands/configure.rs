//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up dynamons CLI defaults.

use crate::config::Config;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `backup_dir` - Optional default backup directory
/// * `retention` - Optional number of backups to keep per save
/// * `show` - If true, show current configuration
pub fn handle(backup_dir: Option<PathBuf>, retention: Option<usize>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if backup_dir.is_none() && retention.is_none() {
        show_usage();
        return Ok(());
    }

    if retention == Some(0) {
        bail!("Retention must be at least 1");
    }

    if backup_dir.is_some() {
        config.backup_dir = backup_dir;
    }
    if retention.is_some() {
        config.retention = retention;
    }
    config.save()?;

    show_config(&config);
    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    println!("Backup directory: {}", config.backup_dir().display());
    println!("Backups kept per save: {}", config.retention());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: dynamons configure --set-backup-dir DIR [--retention N]");
    println!("   or: dynamons configure --show");
}
