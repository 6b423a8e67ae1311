//! Transient in-memory store for session-scoped keys.

use super::kv_store::{normalize_key, KeyValueStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Key/value store whose contents vanish with the process.
///
/// Holds view-restoration state such as the last displayed quote, and doubles
/// as a lightweight store for tests.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops one key. Returns whether it was present.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let key = normalize_key(key)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(key).is_some())
    }
}

impl KeyValueStore for SessionStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let key = normalize_key(key)?;
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = normalize_key(key)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
