//! Backup command CLI definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum BackupCommand {
    /// List backups of a save, oldest first
    List {
        /// Path to the save file
        input: PathBuf,
    },

    /// Back up a save now
    Create { input: PathBuf },

    /// Restore the newest backup over a save
    Restore { input: PathBuf },
}
