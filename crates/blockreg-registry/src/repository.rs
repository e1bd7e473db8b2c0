//! Per-block records on the ledger.

use std::sync::Arc;

use tracing::debug;

use blockreg_store::LedgerStore;
use blockreg_types::{Block, BlockId};

use crate::error::{RegistryError, Result};

/// Loads and saves whole [`Block`] records, one ledger key per block.
///
/// There are no partial updates: callers read the block, modify their copy,
/// and `put` the full record back.
pub struct BlockRepository<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> BlockRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Load the block stored under `id`.
    ///
    /// Fails with [`RegistryError::BlockNotFound`] if nothing is stored,
    /// [`RegistryError::Persistence`] if the read fails, and
    /// [`RegistryError::Serialization`] if the record does not decode or
    /// belongs to a different id.
    pub fn get(&self, id: &BlockId) -> Result<Block> {
        let bytes = self
            .store
            .read(id.as_str())?
            .ok_or_else(|| RegistryError::BlockNotFound(id.clone()))?;
        let block = Block::from_json_bytes(&bytes)?;
        if &block.id != id {
            return Err(RegistryError::Serialization(format!(
                "record under key {id} carries id {}",
                block.id
            )));
        }
        Ok(block)
    }

    /// Overwrite the record under `id` with `block`.
    pub fn put(&self, id: &BlockId, block: &Block) -> Result<()> {
        let bytes = block.to_json_bytes()?;
        self.store.write(id.as_str(), &bytes)?;
        debug!(block_id = %id, renters = block.renter_count(), "block record written");
        Ok(())
    }

    /// Every stored key that has the shape of a block id.
    pub fn stored_ids(&self) -> Result<Vec<BlockId>> {
        Ok(self
            .store
            .keys()?
            .iter()
            .filter_map(|key| BlockId::parse(key).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockreg_store::InMemoryLedgerStore;
    use blockreg_types::Renter;

    fn repo() -> (Arc<InMemoryLedgerStore>, BlockRepository<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        (store.clone(), BlockRepository::new(store))
    }

    #[test]
    fn put_then_get() {
        let (_, repo) = repo();
        let block = Block::new("Elm St", "12", "4");
        repo.put(&block.id, &block).unwrap();
        assert_eq!(repo.get(&block.id).unwrap(), block);
    }

    #[test]
    fn get_missing_block_fails() {
        let (_, repo) = repo();
        let id = BlockId::derive("Nowhere", "0");
        let err = repo.get(&id).unwrap_err();
        assert!(matches!(err, RegistryError::BlockNotFound(missing) if missing == id));
    }

    #[test]
    fn put_overwrites_whole_record() {
        let (_, repo) = repo();
        let mut block = Block::new("Elm St", "12", "4");
        repo.put(&block.id, &block).unwrap();

        block.add_renter(Renter::moving_in_now("Ana", "Lopez"));
        repo.put(&block.id, &block).unwrap();

        assert_eq!(repo.get(&block.id).unwrap().renter_count(), 1);
    }

    #[test]
    fn undecodable_record_is_a_serialization_error() {
        let (store, repo) = repo();
        let id = BlockId::derive("Elm St", "12");
        store.write(id.as_str(), b"garbage").unwrap();
        assert!(matches!(repo.get(&id), Err(RegistryError::Serialization(_))));
    }

    #[test]
    fn record_under_wrong_key_is_rejected() {
        let (store, repo) = repo();
        let block = Block::new("Oak", "7", "2");
        let other = BlockId::derive("Oak", "8");
        store.write(other.as_str(), &block.to_json_bytes().unwrap()).unwrap();
        assert!(matches!(repo.get(&other), Err(RegistryError::Serialization(_))));
    }

    #[test]
    fn stored_ids_skip_reserved_keys() {
        let (store, repo) = repo();
        let block = Block::new("Oak", "7", "2");
        repo.put(&block.id, &block).unwrap();
        store.write("blocksIdCache", b"{}").unwrap();
        assert_eq!(repo.stored_ids().unwrap(), vec![block.id]);
    }
}
