//! Load/edit/save orchestration for preference-document saves.
//!
//! A [`SaveSession`] owns the loaded document and the decoded party, ledger
//! and player settings. Every load and every save attempt is preceded by a
//! backup; a failed save restores the newest backup so the file on disk is
//! never left half-written.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::backup::{BackupError, BackupManager};
use crate::document::{DocumentError, SaveDocument};
use crate::keys::{ItemGrant, PlayerSetting, ITEMS_KEY, PARTY_KEY};
use crate::ledger::{ItemLedger, LedgerError};
use crate::party::{PartyError, PartyRoster};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No save loaded")]
    NotLoaded,

    #[error("Session is in an error state, load a save first: {0}")]
    InErrorState(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Party(#[from] PartyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Backup failed: {0}")]
    Backup(#[from] BackupError),

    #[error("Save failed: {cause}; {restore}")]
    SaveFailed {
        cause: Box<SessionError>,
        restore: RestoreOutcome,
    },
}

/// What happened when a failed save tried to roll back.
#[derive(Debug)]
pub enum RestoreOutcome {
    Restored(PathBuf),
    NoBackupsAvailable,
    Failed(BackupError),
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreOutcome::Restored(path) => write!(f, "restored backup {}", path.display()),
            RestoreOutcome::NoBackupsAvailable => f.write_str("no backups available to restore"),
            RestoreOutcome::Failed(e) => write!(f, "restore failed: {}", e),
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    /// The last load failed; only a new load recovers.
    Error,
}

/// Writes serialized saves to disk.
pub trait SaveWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes to a hidden sibling file, syncs it, then renames it over the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl SaveWriter for AtomicFileWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "save path has no file name")
        })?;
        let mut temp_name = std::ffi::OsString::from(".");
        temp_name.push(file_name);
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        let result = write_then_rename(&temp_path, path, bytes);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

/// A save read from disk together with its editable model.
#[derive(Debug, Clone)]
pub struct LoadedSave {
    path: PathBuf,
    document: SaveDocument,
    party: Option<PartyRoster>,
    ledger: Option<ItemLedger>,
    settings: HashMap<PlayerSetting, String>,
}

impl LoadedSave {
    fn read(path: &Path) -> Result<Self, SessionError> {
        let bytes = fs::read(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = SaveDocument::load(&bytes)?;

        let party = document.get(PARTY_KEY).map(PartyRoster::decode).transpose()?;
        let ledger = document.get(ITEMS_KEY).map(ItemLedger::decode);
        let settings = PlayerSetting::ALL
            .into_iter()
            .filter_map(|s| document.get(s.key()).map(|v| (s, v.to_string())))
            .collect();

        Ok(LoadedSave {
            path: path.to_path_buf(),
            document,
            party,
            ledger,
            settings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    pub fn party(&self) -> Option<&PartyRoster> {
        self.party.as_ref()
    }

    pub fn ledger(&self) -> Option<&ItemLedger> {
        self.ledger.as_ref()
    }

    pub fn setting(&self, setting: PlayerSetting) -> Option<&str> {
        self.settings.get(&setting).map(String::as_str)
    }

    /// Check the edited party and ledger still encode to what they hold.
    fn validate(&self) -> Result<(), SessionError> {
        if let Some(party) = &self.party {
            party.validate()?;
        }
        if let Some(ledger) = &self.ledger {
            ledger.validate()?;
        }
        Ok(())
    }

    /// Copy of the document with the in-memory model written into it.
    ///
    /// The party and ledger are re-encoded only when they differ from what
    /// the document decodes to, and settings only when their text differs,
    /// so an unedited save serializes to its original bytes.
    fn render(&self) -> Result<SaveDocument, SessionError> {
        let mut document = self.document.clone();

        if let Some(party) = &self.party {
            let stored = document.get(PARTY_KEY).map(PartyRoster::decode);
            if !matches!(stored, Some(Ok(ref p)) if p == party) {
                document.set(PARTY_KEY, &party.encode())?;
            }
        }
        if let Some(ledger) = &self.ledger {
            let stored = document.get(ITEMS_KEY).map(ItemLedger::decode);
            if stored.as_ref() != Some(ledger) {
                document.set(ITEMS_KEY, &ledger.encode())?;
            }
        }

        for setting in PlayerSetting::ALL {
            let Some(value) = self.settings.get(&setting) else {
                continue;
            };
            match replace_if_changed(&mut document, setting.key(), value) {
                Ok(()) => {}
                Err(SessionError::Document(DocumentError::KeyNotFound(key))) => {
                    tracing::warn!(%key, "setting not present in save, skipped");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(document)
    }
}

fn replace_if_changed(
    document: &mut SaveDocument,
    key: &str,
    value: &str,
) -> Result<(), SessionError> {
    if document.get(key) != Some(value) {
        document.set(key, value)?;
    }
    Ok(())
}

/// Owns the active save and brackets every change with backups.
#[derive(Debug)]
pub struct SaveSession<W: SaveWriter = AtomicFileWriter> {
    backups: BackupManager,
    writer: W,
    current: Option<LoadedSave>,
    error: Option<String>,
}

impl SaveSession<AtomicFileWriter> {
    pub fn new(backups: BackupManager) -> Self {
        Self::with_writer(backups, AtomicFileWriter)
    }
}

impl<W: SaveWriter> SaveSession<W> {
    pub fn with_writer(backups: BackupManager, writer: W) -> Self {
        SaveSession {
            backups,
            writer,
            current: None,
            error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.error, &self.current) {
            (Some(_), _) => SessionState::Error,
            (None, Some(_)) => SessionState::Loaded,
            (None, None) => SessionState::Unloaded,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Message of the last failed load, while in [`SessionState::Error`].
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The loaded save. Stays readable in the error state, holding whatever
    /// was loaded before the failure.
    pub fn loaded(&self) -> Option<&LoadedSave> {
        self.current.as_ref()
    }

    /// Back up, read and decode the save at `path`.
    ///
    /// The backup is best-effort. On failure the session enters
    /// [`SessionState::Error`] and the previously loaded save is kept as is.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();

        if let Err(e) = self.backups.create_backup(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not back up save before loading");
        }

        match LoadedSave::read(path) {
            Ok(loaded) => {
                tracing::info!(path = %path.display(), "loaded save");
                self.current = Some(loaded);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load save");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Write the edited model back to disk.
    ///
    /// A fresh backup is taken first; if that fails nothing is written. Any
    /// later failure restores the newest backup and reports both outcomes.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded_ref()?;
        loaded.validate()?;
        let path = loaded.path.clone();

        self.backups.create_backup(&path)?;

        let Some(loaded) = self.current.as_ref() else {
            return Err(SessionError::NotLoaded);
        };
        let writer = &mut self.writer;
        let attempt = loaded.render().and_then(|document| {
            writer
                .write(&path, &document.serialize())
                .map_err(|source| SessionError::Io {
                    path: path.clone(),
                    source,
                })?;
            Ok(document)
        });

        match attempt {
            Ok(document) => {
                if let Some(loaded) = self.current.as_mut() {
                    loaded.document = document;
                }
                tracing::info!(path = %path.display(), "saved");
                Ok(())
            }
            Err(cause) => {
                let restore = match self.backups.restore_latest(&path) {
                    Ok(backup) => RestoreOutcome::Restored(backup.path),
                    Err(BackupError::NoBackupsAvailable(_)) => RestoreOutcome::NoBackupsAvailable,
                    Err(e) => RestoreOutcome::Failed(e),
                };
                tracing::error!(path = %path.display(), error = %cause, %restore, "save failed");
                Err(SessionError::SaveFailed {
                    cause: Box::new(cause),
                    restore,
                })
            }
        }
    }

    pub fn party(&self) -> Option<&PartyRoster> {
        self.current.as_ref().and_then(LoadedSave::party)
    }

    /// Editable party; fails when the save has no party entry.
    pub fn party_mut(&mut self) -> Result<&mut PartyRoster, SessionError> {
        self.loaded_mut()?
            .party
            .as_mut()
            .ok_or_else(|| DocumentError::KeyNotFound(PARTY_KEY.to_string()).into())
    }

    pub fn ledger(&self) -> Option<&ItemLedger> {
        self.current.as_ref().and_then(LoadedSave::ledger)
    }

    /// Editable ledger; fails when the save has no item entry.
    pub fn ledger_mut(&mut self) -> Result<&mut ItemLedger, SessionError> {
        self.loaded_mut()?
            .ledger
            .as_mut()
            .ok_or_else(|| DocumentError::KeyNotFound(ITEMS_KEY.to_string()).into())
    }

    pub fn grant(&mut self, grant: ItemGrant) -> Result<(), SessionError> {
        self.ledger_mut()?.merge([grant.update()]);
        Ok(())
    }

    pub fn setting(&self, setting: PlayerSetting) -> Option<&str> {
        self.current.as_ref().and_then(|l| l.setting(setting))
    }

    pub fn set_setting(
        &mut self,
        setting: PlayerSetting,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.loaded_mut()?.settings.insert(setting, value.into());
        Ok(())
    }

    /// Set every player setting to its "max" preset.
    pub fn max_settings(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded_mut()?;
        for setting in PlayerSetting::ALL {
            loaded.settings.insert(setting, setting.max_value().to_string());
        }
        Ok(())
    }

    /// Set every player setting to a fresh save's value.
    pub fn reset_settings(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded_mut()?;
        for setting in PlayerSetting::ALL {
            loaded.settings.insert(setting, setting.default_value().to_string());
        }
        Ok(())
    }

    /// Restore the newest backup over the loaded save's file.
    ///
    /// The in-memory model is not reloaded.
    pub fn restore_latest(&self) -> Result<PathBuf, SessionError> {
        let loaded = self.current.as_ref().ok_or(SessionError::NotLoaded)?;
        Ok(self.backups.restore_latest(&loaded.path)?.path)
    }

    fn loaded_ref(&self) -> Result<&LoadedSave, SessionError> {
        if let Some(e) = &self.error {
            return Err(SessionError::InErrorState(e.clone()));
        }
        self.current.as_ref().ok_or(SessionError::NotLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedSave, SessionError> {
        if let Some(e) = &self.error {
            return Err(SessionError::InErrorState(e.clone()));
        }
        self.current.as_mut().ok_or(SessionError::NotLoaded)
    }
}
