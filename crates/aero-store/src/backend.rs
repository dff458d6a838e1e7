//! Storage backends.
//!
//! The store persists JSON-encoded values into a backend keyed by
//! `(collection, key)`. The host supplies the real backend (browser
//! storage or a remote KV service); `MemoryBackend` backs tests and
//! ephemeral sessions.

use std::collections::HashMap;

use crate::error::StoreError;

/// Persistence interface for the store.
///
/// Values are already JSON-encoded strings by the time they reach the
/// backend. Implementations must overwrite on `set` and treat a missing
/// key as `Ok(None)`, never as an error.
pub trait StorageBackend {
    /// Read a value.
    fn get(&self, collection: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Write (or overwrite) a value.
    fn set(&mut self, collection: &str, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove a single key. Removing a missing key is a no-op.
    fn remove(&mut self, collection: &str, key: &str) -> Result<bool, StoreError>;

    /// List the keys of a collection.
    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Drop a whole collection.
    fn remove_collection(&mut self, collection: &str) -> Result<bool, StoreError>;

    /// List known collection names.
    fn collections(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory backend.
#[derive(Default)]
pub struct MemoryBackend {
    data: HashMap<String, HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, collection: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .data
            .get(collection)
            .and_then(|c| c.get(key))
            .cloned())
    }

    fn set(&mut self, collection: &str, key: &str, value: String) -> Result<(), StoreError> {
        self.data
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .data
            .get_mut(collection)
            .map(|c| c.remove(key).is_some())
            .unwrap_or(false))
    }

    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .data
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn remove_collection(&mut self, collection: &str) -> Result<bool, StoreError> {
        Ok(self.data.remove(collection).is_some())
    }

    fn collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.data.keys().cloned().collect())
    }
}
