//! Cached set of block ids known to exist.
//!
//! The index is a projection of a single reserved ledger key. It is never the
//! source of truth on its own: [`ExistenceIndex::load`] rebuilds it from the
//! ledger, and the registry calls it whenever the cached copy may be stale.
//! A record that no longer decodes marks the index as damaged; the registry
//! then rebuilds it from the block records.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use blockreg_store::LedgerStore;
use blockreg_types::BlockId;

use crate::error::Result;

/// Mapping from block id to presence, persisted under one reserved key.
///
/// Stored as a JSON object of `{ "<block id>": true }`.
pub struct ExistenceIndex<S> {
    store: Arc<S>,
    key: String,
    entries: BTreeMap<BlockId, bool>,
    /// The persisted record failed to decode on the last load.
    damaged: bool,
}

impl<S: LedgerStore> ExistenceIndex<S> {
    /// Create an empty, unloaded index persisted under `key`.
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            entries: BTreeMap::new(),
            damaged: false,
        }
    }

    /// The reserved ledger key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the in-memory copy with the persisted one.
    ///
    /// An absent key yields an empty index. Entries whose key is not a valid
    /// block id are dropped with a warning. A record that does not decode
    /// yields an empty index flagged by [`ExistenceIndex::is_damaged`].
    pub fn load(&mut self) -> Result<()> {
        self.damaged = false;
        let Some(bytes) = self.store.read(&self.key)? else {
            self.entries.clear();
            debug!(key = %self.key, "no persisted index; starting empty");
            return Ok(());
        };

        let raw: BTreeMap<String, bool> = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "persisted index does not decode; starting empty");
                self.entries.clear();
                self.damaged = true;
                return Ok(());
            }
        };
        let mut entries = BTreeMap::new();
        for (id, present) in raw {
            match BlockId::parse(&id) {
                Ok(id) => {
                    entries.insert(id, present);
                }
                Err(e) => warn!(key = %self.key, error = %e, "dropping malformed index entry"),
            }
        }

        self.entries = entries;
        debug!(key = %self.key, blocks = self.len(), "index loaded");
        Ok(())
    }

    /// Returns `true` if the last load found an undecodable record.
    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    /// Returns `true` if `id` is marked present.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.entries.get(id).copied().unwrap_or(false)
    }

    /// Mark `id` present and persist the index before returning.
    ///
    /// If the write fails the in-memory copy is left untouched, so the index
    /// never reports presence that is not durable.
    pub fn add(&mut self, id: &BlockId) -> Result<()> {
        if self.contains(id) {
            return Ok(());
        }

        let mut next = self.entries.clone();
        next.insert(id.clone(), true);
        self.persist(&next)?;
        self.entries = next;
        self.damaged = false;

        debug!(key = %self.key, block_id = %id, blocks = self.len(), "index entry added");
        Ok(())
    }

    /// Persist the in-memory copy as is, replacing a damaged record.
    pub fn rewrite(&mut self) -> Result<()> {
        self.persist(&self.entries)?;
        self.damaged = false;
        debug!(key = %self.key, blocks = self.len(), "index rewritten");
        Ok(())
    }

    /// Ids marked present. Order carries no meaning.
    pub fn enumerate(&self) -> Vec<BlockId> {
        self.entries
            .iter()
            .filter(|(_, present)| **present)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of ids marked present.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|present| **present).count()
    }

    /// Returns `true` if no id is marked present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &BTreeMap<BlockId, bool>) -> Result<()> {
        let raw: BTreeMap<&str, bool> = entries
            .iter()
            .map(|(id, present)| (id.as_str(), *present))
            .collect();
        let bytes = serde_json::to_vec(&raw)?;
        self.store.write(&self.key, &bytes)?;
        Ok(())
    }
}
