//! Credential persistence
//!
//! The token store owns the single persisted credential. It survives restarts
//! of the client, unlike the in-memory session snapshot.
//!
//! - [`file`] - JSON-file backed store holding one named entry
//! - [`memory`] - in-process store for tests and throwaway sessions

pub mod file;
pub mod memory;

use crate::models::Credential;
use std::path::PathBuf;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Default name of the persisted entry holding the credential
pub const DEFAULT_TOKEN_KEY: &str = "authToken";

/// Errors raised while writing or clearing the persisted credential
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access token storage at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token storage at {path} is not a JSON object: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Get/set/clear access to the persisted credential
///
/// The credential is treated as an opaque string; no structural validation
/// happens here. `get` never fails: unreadable storage reads as "absent".
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<Credential>;

    /// Persist the credential, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn set(&self, credential: &Credential) -> Result<(), StorageError>;

    /// Remove the credential; clearing an empty store is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn clear(&self) -> Result<(), StorageError>;

    /// Remove the credential only if it is still `expected`
    ///
    /// Returns whether anything was removed. A credential stored since
    /// `expected` was read is left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn clear_if(&self, expected: &Credential) -> Result<bool, StorageError>;

    fn has_credential(&self) -> bool {
        self.get().is_some()
    }
}
