//! Blob save command handlers

use anyhow::{bail, Context, Result};
use dynamons::blob::RowKind;
use dynamons::{BackupManager, BlobNode, BlobValue};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::cli::BlobCommand;

pub fn handle(command: BlobCommand, backups: &BackupManager) -> Result<()> {
    match command {
        BlobCommand::Show { input } => show(&input),
        BlobCommand::Get { input, path } => get(&input, &path),
        BlobCommand::Set {
            input,
            path,
            value,
            no_backup,
        } => set(&input, &path, &value, (!no_backup).then_some(backups)),
        BlobCommand::Decode { input, output } => decode(&input, output.as_deref()),
        BlobCommand::Encode { output, json } => encode(json.as_deref(), &output),
    }
}

/// Split a dot-separated key path, rejecting empty segments.
fn parse_path(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        bail!("Invalid key path: '{}'", path);
    }
    Ok(parts)
}

fn read_blob(input: &Path) -> Result<BlobNode> {
    BlobNode::read_file(input).with_context(|| format!("Failed to read blob {}", input.display()))
}

/// Handle `blob show`
fn show(input: &Path) -> Result<()> {
    let root = read_blob(input)?;
    for row in root.flatten() {
        let indent = "  ".repeat(row.depth());
        match &row.kind {
            RowKind::Branch => println!("{}{}:", indent, row.key()),
            RowKind::Leaf(value) => {
                println!("{}{} = {} ({})", indent, row.key(), value, value.kind())
            }
        }
    }
    Ok(())
}

/// Handle `blob get`
fn get(input: &Path, path: &str) -> Result<()> {
    let root = read_blob(input)?;
    let parts = parse_path(path)?;
    match root.get_path(&parts) {
        Some(BlobValue::Node(node)) => println!("{}", node.to_json_pretty()?),
        Some(value) => println!("{}", value),
        None => bail!("Path not found: {}", path),
    }
    Ok(())
}

/// Handle `blob set`
///
/// With a backup manager, the file is backed up first and the newest backup is
/// restored if the write fails.
fn set(input: &Path, path: &str, value: &str, backups: Option<&BackupManager>) -> Result<()> {
    let mut root = read_blob(input)?;
    let parts = parse_path(path)?;
    root.set_text(&parts, value)
        .with_context(|| format!("Failed to set {}", path))?;

    if let Some(backups) = backups {
        backups
            .create_backup(input)
            .with_context(|| format!("Failed to back up {}", input.display()))?;
    }

    if let Err(e) = root.write_file(input) {
        if let Some(backups) = backups {
            match backups.restore_latest(input) {
                Ok(backup) => eprintln!("Restored {}", backup.path.display()),
                Err(restore) => eprintln!("Restore failed: {}", restore),
            }
        }
        return Err(e).with_context(|| format!("Failed to write {}", input.display()));
    }

    if let Some(updated) = root.get_path(&parts) {
        println!("{} = {} ({})", path, updated, updated.kind());
    }
    Ok(())
}

/// Read JSON text from a file, or stdin when no path is given
fn read_json(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => {
            fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read JSON from stdin")?;
            Ok(text)
        }
    }
}

/// Write JSON text plus a final newline to a file, or stdout when no path is given
fn write_json(path: Option<&Path>, json: &str) -> Result<()> {
    let text = format!("{}\n", json);
    match path {
        Some(p) => fs::write(p, text).with_context(|| format!("Failed to write {}", p.display())),
        None => io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("Failed to write JSON to stdout"),
    }
}

/// Handle `blob decode`
fn decode(input: &Path, output: Option<&Path>) -> Result<()> {
    let root = read_blob(input)?;
    write_json(output, &root.to_json_pretty()?)
}

/// Handle `blob encode`
fn encode(json: Option<&Path>, output: &Path) -> Result<()> {
    let text = read_json(json)?;
    let root = BlobNode::from_json_str(&text).context("Failed to parse JSON")?;
    root.write_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Wrote {}", output.display());
    Ok(())
}
