//! Session store persisted as a JSON object on disk.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{StorageKey, StoreError, TokenStore};

/// A session store backed by a JSON file.
///
/// The file holds a flat object keyed by [`StorageKey::as_str`]. A missing
/// file is an empty session. Every write replaces the file through a
/// sibling temporary file and a rename, so readers never see half a session.
/// On Unix the file is readable by its owner only.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

type Entries = BTreeMap<String, String>;

impl FileStore {
    /// Use the session file at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<Entries, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Entries::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn update(&self, f: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // A corrupt file is overwritten rather than blocking logout forever.
        let mut entries = self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable session file");
            Entries::new()
        });
        f(&mut entries);
        self.save(&entries)
    }
}

fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // A leftover temp file keeps the mode it was created with.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}

impl TokenStore for FileStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.load() {
            Ok(mut entries) => entries.remove(key.as_str()),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to read session file");
                None
            }
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    fn replace_all(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        self.update(|stored| {
            for key in StorageKey::ALL {
                stored.remove(key.as_str());
            }
            stored.extend(
                entries
                    .iter()
                    .map(|(key, value)| (key.as_str().to_owned(), value.clone())),
            );
        })
    }
}
