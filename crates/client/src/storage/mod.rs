//! Persisted session store.
//!
//! A small key-value store holding the access and refresh tokens plus the
//! denormalized user fields the client needs before the first profile
//! fetch. Values are stored as plain strings; nothing is encrypted and no
//! expiry is kept beside the token's own `exp` claim.

mod file;
mod memory;

use std::path::PathBuf;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Every key the session store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    UserRole,
    UserId,
    UserName,
    UserEmail,
    RoleId,
    BranchId,
}

impl StorageKey {
    /// All keys, cleared together on logout.
    pub const ALL: [Self; 8] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::UserRole,
        Self::UserId,
        Self::UserName,
        Self::UserEmail,
        Self::RoleId,
        Self::BranchId,
    ];

    /// The name the value is stored under.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::UserRole => "userRole",
            Self::UserId => "userId",
            Self::UserName => "userName",
            Self::UserEmail => "userEmail",
            Self::RoleId => "roleId",
            Self::BranchId => "branchId",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a session store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value storage for the session.
///
/// Reads are infallible from the caller's point of view: a backend that
/// cannot read returns `None` and logs why.
pub trait TokenStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: StorageKey) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not persist the value.
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not persist the removal.
    fn remove(&self, key: StorageKey) -> Result<(), StoreError>;

    /// Replace the whole session in one write: every key in `entries` is set,
    /// every other key is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not persist the session.
    fn replace_all(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        for key in StorageKey::ALL {
            match entries.iter().find(|(k, _)| *k == key) {
                Some((_, value)) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }

    /// Remove every session key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not persist the removal.
    fn clear(&self) -> Result<(), StoreError> {
        self.replace_all(&[])
    }
}

/// Remove every session key, logging rather than returning a failure.
pub fn clear_session(store: &dyn TokenStore) {
    if let Err(e) = store.clear() {
        tracing::warn!(error = %e, "Failed to clear stored session");
    }
}
