//! Blob command CLI definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum BlobCommand {
    /// Show the blob as an indented key/value tree
    Show {
        /// Path to blob save file
        input: PathBuf,
    },

    /// Print one value
    Get {
        input: PathBuf,

        /// Dot-separated key path (e.g. "player.coins")
        path: String,
    },

    /// Set one leaf value (integers, decimals and true/false are detected)
    Set {
        input: PathBuf,

        /// Dot-separated key path
        path: String,

        value: String,

        /// Skip the backup before writing
        #[arg(long)]
        no_backup: bool,
    },

    /// Decode to indented JSON (stdout or -o file)
    Decode {
        input: PathBuf,

        /// Path to output JSON file (uses stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encode JSON (positional file or stdin) into a blob save
    Encode {
        /// Blob save file to write
        output: PathBuf,

        /// JSON input file (reads stdin if not provided)
        json: Option<PathBuf>,
    },
}
