//! File-backed token store
//!
//! The storage file is a flat JSON object, the client-side equivalent of a
//! browser's local storage area. Only one key belongs to this store; any other
//! keys found in the file are left untouched.

use super::{StorageError, TokenStore, DEFAULT_TOKEN_KEY};
use crate::models::Credential;
use crate::settings::StorageSettings;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

type Entries = Map<String, Value>;

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
    // serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, DEFAULT_TOKEN_KEY)
    }

    #[must_use]
    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::with_key(&settings.token_file, &settings.token_key)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries to rewrite on mutation; a corrupt file is replaced rather than
    /// blocking login or logout
    fn entries_for_update(&self) -> Result<Entries, StorageError> {
        match self.read_entries() {
            Err(StorageError::Format { path, source }) => {
                warn!(
                    "Discarding unreadable token storage at {}: {}",
                    path.display(),
                    source
                );
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let body = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })?;

        // write-then-rename so a crash never leaves a half-written file
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, body).map_err(io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(io_error)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Credential> {
        match self.read_entries() {
            Ok(entries) => entries
                .get(&self.key)
                .and_then(Value::as_str)
                .and_then(|raw| Credential::from_raw(Some(raw))),
            Err(e) => {
                warn!("Treating token storage as empty: {e}");
                None
            }
        }
    }

    fn set(&self, credential: &Credential) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_update()?;
        entries.insert(
            self.key.clone(),
            Value::String(credential.as_str().to_string()),
        );
        self.write_entries(&entries)?;
        debug!("Stored credential under '{}' in {}", self.key, self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_update()?;
        if entries.remove(&self.key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)?;
        debug!("Cleared credential '{}' from {}", self.key, self.path.display());
        Ok(())
    }

    fn clear_if(&self, expected: &Credential) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_update()?;
        if entries.get(&self.key).and_then(Value::as_str) != Some(expected.as_str()) {
            return Ok(false);
        }
        entries.remove(&self.key);
        self.write_entries(&entries)?;
        debug!("Cleared credential '{}' from {}", self.key, self.path.display());
        Ok(true)
    }
}
