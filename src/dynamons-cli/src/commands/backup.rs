//! Backup command handlers

use anyhow::{Context, Result};
use dynamons::BackupManager;

use crate::cli::BackupCommand;

pub fn handle(command: BackupCommand, backups: &BackupManager) -> Result<()> {
    match command {
        BackupCommand::List { input } => {
            let list = backups.list(&input).context("Failed to list backups")?;
            if list.is_empty() {
                println!("No backups of {} in {}", input.display(), backups.dir().display());
                return Ok(());
            }
            for backup in list {
                println!(
                    "{}  {}",
                    backup.created_at.format("%Y-%m-%d %H:%M:%S"),
                    backup.path.display()
                );
            }
        }

        BackupCommand::Create { input } => {
            let backup = backups
                .create_backup(&input)
                .with_context(|| format!("Failed to back up {}", input.display()))?;
            println!("Created {}", backup.path.display());
        }

        BackupCommand::Restore { input } => {
            let backup = backups
                .restore_latest(&input)
                .with_context(|| format!("Failed to restore {}", input.display()))?;
            println!(
                "Restored {} from {}",
                input.display(),
                backup.path.display()
            );
        }
    }

    Ok(())
}
