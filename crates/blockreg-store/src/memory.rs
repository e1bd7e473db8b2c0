use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::LedgerStore;

/// In-memory, HashMap-based ledger store.
///
/// Intended for tests and embedding. Values are cloned on read and write and
/// are lost when the store is dropped.
pub struct InMemoryLedgerStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedgerStore")
            .field("key_count", &self.len())
            .finish()
    }
}
