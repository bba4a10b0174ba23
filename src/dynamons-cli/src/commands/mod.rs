//! Command handlers for dynamons CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod backup;
pub mod blob;
pub mod configure;
pub mod save;
