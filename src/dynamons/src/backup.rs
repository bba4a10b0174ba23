//! Timestamped backups with bounded retention.
//!
//! Every backup is a plain copy of the save named
//! `{stem}_{YYYYMMDD_HHMMSS}.bak` inside the backup directory. After each new
//! backup, older copies of the same stem beyond the retention limit are
//! deleted. Two backups taken within the same second get a counter suffix
//! (`{stem}_{YYYYMMDD_HHMMSS}_01.bak`) instead of overwriting each other.

use chrono::{Local, NaiveDateTime, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Backups kept per source file.
pub const DEFAULT_RETENTION: usize = 5;

/// Backup directory used when none is configured, relative to the working directory.
pub const DEFAULT_BACKUP_DIR: &str = "save_backups";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;
const BACKUP_SUFFIX: &str = ".bak";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No backups available for {}", .0.display())]
    NoBackupsAvailable(PathBuf),

    #[error("Cannot derive a backup name from {}", .0.display())]
    InvalidSource(PathBuf),
}

/// A backup copy on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    /// File stem of the save this backup was taken from
    pub source_stem: String,

    /// Timestamp encoded in the backup's file name
    pub created_at: NaiveDateTime,

    pub path: PathBuf,
}

/// Creates, prunes and restores backups in one directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    retention: usize,
}

impl Default for BackupManager {
    fn default() -> Self {
        BackupManager::new(DEFAULT_BACKUP_DIR)
    }
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        BackupManager {
            dir: dir.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keep at most `retention` backups per source (never fewer than one).
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Copy `source` into the backup directory, stamped with the current local time.
    pub fn create_backup(&self, source: &Path) -> Result<Backup, BackupError> {
        self.create_backup_at(source, Local::now().naive_local())
    }

    /// Copy `source` into the backup directory under an explicit timestamp,
    /// then prune old backups of the same stem.
    pub fn create_backup_at(
        &self,
        source: &Path,
        timestamp: NaiveDateTime,
    ) -> Result<Backup, BackupError> {
        let stem = source_stem(source)?;
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        fs::create_dir_all(&self.dir)?;

        let base = format!("{}_{}", stem, timestamp.format(TIMESTAMP_FORMAT));
        let mut path = self.dir.join(format!("{}{}", base, BACKUP_SUFFIX));
        let mut counter = 0u32;
        while path.exists() {
            counter += 1;
            path = self
                .dir
                .join(format!("{}_{:02}{}", base, counter, BACKUP_SUFFIX));
        }

        fs::copy(source, &path)?;
        tracing::info!(
            source = %source.display(),
            backup = %path.display(),
            "created backup"
        );

        self.prune(source)?;

        Ok(Backup {
            source_stem: stem.to_string(),
            created_at: timestamp,
            path,
        })
    }

    /// Backups of `source`, oldest first by modification time.
    pub fn list(&self, source: &Path) -> Result<Vec<Backup>, BackupError> {
        let stem = source_stem(source)?;

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found: Vec<(SystemTime, Backup)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(created_at) = name.to_str().and_then(|n| parse_backup_name(n, stem)) else {
                continue;
            };
            if !entry.file_type()?.is_file() {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            found.push((
                modified,
                Backup {
                    source_stem: stem.to_string(),
                    created_at,
                    path: entry.path(),
                },
            ));
        }

        found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.path.cmp(&b.1.path)));
        Ok(found.into_iter().map(|(_, backup)| backup).collect())
    }

    /// Most recent backup of `source`, if any.
    pub fn latest(&self, source: &Path) -> Result<Option<Backup>, BackupError> {
        Ok(self.list(source)?.pop())
    }

    /// Copy the most recent backup over `source`.
    ///
    /// Returns [`BackupError::NoBackupsAvailable`] and leaves `source` alone
    /// when there is nothing to restore.
    pub fn restore_latest(&self, source: &Path) -> Result<Backup, BackupError> {
        let backup = self
            .latest(source)?
            .ok_or_else(|| BackupError::NoBackupsAvailable(source.to_path_buf()))?;

        fs::copy(&backup.path, source)?;
        tracing::info!(
            source = %source.display(),
            backup = %backup.path.display(),
            "restored backup"
        );

        Ok(backup)
    }

    /// Delete the oldest backups of `source` beyond the retention limit.
    fn prune(&self, source: &Path) -> Result<Vec<PathBuf>, BackupError> {
        let backups = self.list(source)?;
        let excess = backups.len().saturating_sub(self.retention);

        let mut removed = Vec::with_capacity(excess);
        for backup in backups.into_iter().take(excess) {
            fs::remove_file(&backup.path)?;
            tracing::debug!(backup = %backup.path.display(), "pruned backup");
            removed.push(backup.path);
        }
        Ok(removed)
    }
}

fn source_stem(source: &Path) -> Result<&str, BackupError> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BackupError::InvalidSource(source.to_path_buf()))
}

/// Timestamp of a backup file name belonging to `stem`, if it is one.
fn parse_backup_name(name: &str, stem: &str) -> Option<NaiveDateTime> {
    let rest = name
        .strip_prefix(stem)?
        .strip_prefix('_')?
        .strip_suffix(BACKUP_SUFFIX)?;

    let timestamp = rest.get(..TIMESTAMP_LEN)?;
    let counter = rest.get(TIMESTAMP_LEN..)?;
    if !counter.is_empty() {
        let digits = counter.strip_prefix('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, second)
            .unwrap()
    }

    fn setup() -> (tempfile::TempDir, PathBuf, BackupManager) {
        let temp_dir = tempfile::tempdir().unwrap();
        let save_path = temp_dir.path().join("MainActivity.xml");
        fs::write(&save_path, b"original").unwrap();
        let manager = BackupManager::new(temp_dir.path().join("save_backups"));
        (temp_dir, save_path, manager)
    }

    #[test]
    fn test_backup_name_format() {
        let (_dir, save_path, manager) = setup();
        let backup = manager.create_backup_at(&save_path, at(45)).unwrap();

        assert_eq!(
            backup.path.file_name().unwrap(),
            "MainActivity_20240501_123045.bak"
        );
        assert_eq!(backup.source_stem, "MainActivity");
        assert_eq!(backup.created_at, at(45));
        assert_eq!(fs::read(&backup.path).unwrap(), b"original");
    }

    #[test]
    fn test_same_second_gets_counter() {
        let (_dir, save_path, manager) = setup();
        let first = manager.create_backup_at(&save_path, at(1)).unwrap();
        let second = manager.create_backup_at(&save_path, at(1)).unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(
            second.path.file_name().unwrap(),
            "MainActivity_20240501_123001_01.bak"
        );
        assert_eq!(manager.list(&save_path).unwrap().len(), 2);
    }

    #[test]
    fn test_create_backup_now() {
        let (_dir, save_path, manager) = setup();
        let backup = manager.create_backup(&save_path).unwrap();
        assert!(backup.path.exists());
        assert_eq!(manager.list(&save_path).unwrap(), vec![backup]);
    }

    #[test]
    fn test_retention_keeps_newest_five() {
        let (_dir, save_path, manager) = setup();

        let mut created = Vec::new();
        for second in 0..8 {
            fs::write(&save_path, format!("state {}", second)).unwrap();
            created.push(manager.create_backup_at(&save_path, at(second)).unwrap());
        }

        let remaining = manager.list(&save_path).unwrap();
        assert_eq!(remaining.len(), DEFAULT_RETENTION);
        assert_eq!(remaining, created[3..].to_vec());
        assert!(!created[0].path.exists());
        assert_eq!(fs::read(&remaining[4].path).unwrap(), b"state 7");
    }

    #[test]
    fn test_retention_is_per_source() {
        let (dir, save_path, manager) = setup();
        let other = dir.path().join("Other.xml");
        fs::write(&other, b"other").unwrap();

        manager.create_backup_at(&other, at(0)).unwrap();
        for second in 1..8 {
            manager.create_backup_at(&save_path, at(second)).unwrap();
        }

        assert_eq!(manager.list(&other).unwrap().len(), 1);
        assert_eq!(manager.list(&save_path).unwrap().len(), 5);
    }

    #[test]
    fn test_custom_retention() {
        let (_dir, save_path, manager) = setup();
        let manager = manager.with_retention(2);
        for second in 0..4 {
            manager.create_backup_at(&save_path, at(second)).unwrap();
        }
        assert_eq!(manager.list(&save_path).unwrap().len(), 2);
        assert_eq!(manager.clone().with_retention(0).retention(), 1);
    }

    #[test]
    fn test_restore_latest() {
        let (_dir, save_path, manager) = setup();
        manager.create_backup_at(&save_path, at(0)).unwrap();
        fs::write(&save_path, b"second").unwrap();
        let latest = manager.create_backup_at(&save_path, at(1)).unwrap();

        fs::write(&save_path, b"corrupt").unwrap();
        let restored = manager.restore_latest(&save_path).unwrap();

        assert_eq!(restored, latest);
        assert_eq!(fs::read(&save_path).unwrap(), b"second");
    }

    #[test]
    fn test_restore_without_backups() {
        let (_dir, save_path, manager) = setup();
        let result = manager.restore_latest(&save_path);

        assert!(matches!(result, Err(BackupError::NoBackupsAvailable(_))));
        assert_eq!(fs::read(&save_path).unwrap(), b"original");
    }

    #[test]
    fn test_backup_missing_source() {
        let (dir, _save_path, manager) = setup();
        let result = manager.create_backup(&dir.path().join("missing.xml"));
        assert!(matches!(result, Err(BackupError::Io(_))));
    }

    #[test]
    fn test_parse_backup_name() {
        assert_eq!(
            parse_backup_name("Main_20240501_123045.bak", "Main"),
            Some(at(45))
        );
        assert_eq!(
            parse_backup_name("Main_20240501_123045_03.bak", "Main"),
            Some(at(45))
        );
        assert_eq!(parse_backup_name("Main_20240501_123045.xml", "Main"), None);
        assert_eq!(parse_backup_name("Main_20240501_123045_x.bak", "Main"), None);
        assert_eq!(parse_backup_name("MainX_20240501_123045.bak", "Main"), None);
        assert_eq!(parse_backup_name("Main_notatimestamp.bak", "Main"), None);
    }

    #[test]
    fn test_source_without_stem() {
        let manager = BackupManager::default();
        assert!(matches!(
            manager.list(Path::new("/")),
            Err(BackupError::InvalidSource(_))
        ));
        assert_eq!(manager.dir(), Path::new(DEFAULT_BACKUP_DIR));
    }
}
