//! CLI argument definitions for dynamons
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod backup;
mod blob;
mod core;
mod save;

pub use backup::BackupCommand;
pub use blob::BlobCommand;
pub use core::{Cli, Commands};
pub use save::{SaveAction, SaveArgs};
