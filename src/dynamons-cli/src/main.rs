mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use dynamons::BackupManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let backup_override = cli.backup_dir;
    let backups = || -> Result<BackupManager> {
        Ok(Config::load()?.backup_manager(backup_override.as_deref()))
    };

    match cli.command {
        Commands::Configure {
            backup_dir,
            retention,
            show,
        } => {
            commands::configure::handle(backup_dir, retention, show)?;
        }

        Commands::Save(args) => {
            commands::save::handle(args, backups()?)?;
        }

        Commands::Blob { command } => {
            commands::blob::handle(command, &backups()?)?;
        }

        Commands::Backup { command } => {
            commands::backup::handle(command, &backups()?)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "dynamons=info",
        1 => "dynamons=debug",
        _ => "dynamons=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
