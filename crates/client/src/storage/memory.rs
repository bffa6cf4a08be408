//! In-process session store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{StorageKey, StoreError, TokenStore};

/// A session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<StorageKey, String>> {
        // The map is never left half-written, so a poisoned lock is still usable.
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.values().get(&key).cloned()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.values().insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.values().remove(&key);
        Ok(())
    }

    fn replace_all(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        let mut values = self.values();
        values.clear();
        values.extend(entries.iter().cloned());
        Ok(())
    }
}
