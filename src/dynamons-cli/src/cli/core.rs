//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::backup::BackupCommand;
use super::blob::BlobCommand;
use super::save::SaveArgs;

#[derive(Parser)]
#[command(name = "dynamons")]
#[command(about = "Dynamons World Save Editor", long_about = None)]
pub struct Cli {
    /// Backup directory (overrides the configured one)
    #[arg(long, global = true, env = "DYNAMONS_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Log more detail (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preference save operations (party, items, settings)
    #[command(visible_alias = "s")]
    Save(SaveArgs),

    /// Base64+JSON blob save operations
    #[command(visible_alias = "b")]
    Blob {
        #[command(subcommand)]
        command: BlobCommand,
    },

    /// Backup management (list, create, restore)
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default backup directory
        #[arg(long = "set-backup-dir", value_name = "DIR")]
        backup_dir: Option<PathBuf>,

        /// Set how many backups to keep per save
        #[arg(long)]
        retention: Option<usize>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
