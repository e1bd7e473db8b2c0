use std::sync::Arc;

use tracing::{debug, info, warn};

use blockreg_store::LedgerStore;
use blockreg_types::{Block, BlockId, Renter};

use crate::config::{IndexReload, RegistryConfig};
use crate::dispatch::Invocation;
use crate::error::{RegistryError, Result};
use crate::index::ExistenceIndex;
use crate::repository::BlockRepository;

/// The apartment block registry.
///
/// Owns the block repository and the existence index for one ledger. All
/// state lives in this value; there is nothing process-global.
///
/// Creating a block is a two-phase write: the block record first, then the
/// index entry. A crash between the two leaves an orphan record that is not
/// indexed. Orphans are adopted when someone tries to create the same block
/// again, or in bulk by [`Registry::repair_index`].
pub struct Registry<S> {
    config: RegistryConfig,
    repository: BlockRepository<S>,
    index: ExistenceIndex<S>,
}

impl<S: LedgerStore> Registry<S> {
    /// Open a registry over `store` and load its index.
    pub fn open(store: Arc<S>, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        let mut registry = Self {
            repository: BlockRepository::new(store.clone()),
            index: ExistenceIndex::new(store, config.index_key.clone()),
            config,
        };
        registry.refresh()?;
        info!(
            index_key = %registry.config.index_key,
            blocks = registry.index.len(),
            "registry opened"
        );
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Re-read the existence index from the ledger.
    ///
    /// An index record that no longer decodes is rebuilt from the block
    /// records, as [`Registry::repair_index`] does.
    pub fn refresh(&mut self) -> Result<()> {
        self.index.load()?;
        if self.index.is_damaged() {
            warn!(index_key = %self.config.index_key, "rebuilding damaged index from block records");
            self.repair_index()?;
        }
        Ok(())
    }

    /// Run a named operation with positional arguments and encode its result.
    ///
    /// Arguments are validated before anything is read. Under
    /// [`IndexReload::PerInvocation`] the index is reloaded before the
    /// operation runs.
    pub fn invoke<A: AsRef<str>>(&mut self, operation: &str, args: &[A]) -> Result<Vec<u8>> {
        let invocation = Invocation::parse(operation, args)?;
        if self.config.index_reload == IndexReload::PerInvocation {
            self.refresh()?;
        }

        let op = invocation.operation();
        if op.is_mutation() {
            info!(operation = %op, "invoking");
        } else {
            debug!(operation = %op, "invoking");
        }
        self.execute(invocation)
    }

    /// Run a validated invocation and encode its result.
    pub fn execute(&mut self, invocation: Invocation) -> Result<Vec<u8>> {
        let payload = match invocation {
            Invocation::CreateBlock {
                street,
                number,
                n_of_rooms,
            } => {
                let block = self.create_block(&street, &number, &n_of_rooms)?;
                format!("Successfully created block {}.", block.id).into_bytes()
            }
            Invocation::RegisterRenter {
                street,
                number,
                name,
                surname,
            } => {
                let count = self.register_renter(&street, &number, &name, &surname)?;
                let id = BlockId::derive(&street, &number);
                format!("Block {id} has now {count} renters").into_bytes()
            }
            Invocation::QueryRenter {
                street,
                number,
                name,
            } => serde_json::to_vec(&self.query_renter(&street, &number, &name)?)?,
            Invocation::BlocksCount => format!("{} blocks found", self.blocks_count()).into_bytes(),
            Invocation::RentersCount { street, number } => {
                let count = self.renters_count(&street, &number)?;
                let id = BlockId::derive(&street, &number);
                format!("{count} renters in {id} found").into_bytes()
            }
            Invocation::FindEmptyBlock => serde_json::to_vec(&self.find_empty_block()?)?,
            Invocation::RepairIndex => {
                format!("{} orphan blocks adopted", self.repair_index()?).into_bytes()
            }
        };
        Ok(payload)
    }

    /// Create an empty block at `street` and `number`.
    ///
    /// The block record is written before the index entry. If the id is not
    /// indexed but a decodable record already exists, that record is an
    /// orphan from an interrupted create: it is adopted into the index and the
    /// call fails with [`RegistryError::BlockAlreadyExists`]. An undecodable
    /// record is never adopted; it is overwritten by the new block.
    pub fn create_block(&mut self, street: &str, number: &str, n_of_rooms: &str) -> Result<Block> {
        let id = BlockId::derive(street, number);
        if self.index.contains(&id) {
            return Err(RegistryError::BlockAlreadyExists(id));
        }

        match self.repository.get(&id) {
            Ok(_) => {
                warn!(block_id = %id, "adopting unindexed block record");
                self.index.add(&id)?;
                return Err(RegistryError::BlockAlreadyExists(id));
            }
            Err(RegistryError::BlockNotFound(_)) => {}
            Err(RegistryError::Serialization(reason)) => {
                warn!(block_id = %id, %reason, "replacing undecodable block record");
            }
            Err(e) => return Err(e),
        }

        let block = Block::new(street, number, n_of_rooms);
        self.repository.put(&id, &block)?;
        self.index.add(&id)?;

        info!(block_id = %id, n_of_rooms, "block created");
        Ok(block)
    }

    /// Append a renter, stamped with the current time, and return the
    /// block's new renter count.
    pub fn register_renter(
        &mut self,
        street: &str,
        number: &str,
        name: &str,
        surname: &str,
    ) -> Result<usize> {
        let id = BlockId::derive(street, number);
        if !self.index.contains(&id) {
            return Err(RegistryError::BlockNotFound(id));
        }

        let mut block = self.repository.get(&id)?;
        let count = block.add_renter(Renter::moving_in_now(name, surname));
        self.repository.put(&id, &block)?;

        info!(block_id = %id, renters = count, "renter registered");
        Ok(count)
    }

    /// Look up a renter by exact name.
    ///
    /// If several renters share the name, the earliest registered one is
    /// returned.
    pub fn query_renter(&self, street: &str, number: &str, name: &str) -> Result<Renter> {
        let id = BlockId::derive(street, number);
        if !self.index.contains(&id) {
            return Err(RegistryError::BlockNotFound(id));
        }

        let block = self.repository.get(&id)?;
        block
            .find_renter(name)
            .cloned()
            .ok_or_else(|| RegistryError::RenterNotFound {
                block: id,
                name: name.to_string(),
            })
    }

    /// Number of indexed blocks. Reads no block records.
    pub fn blocks_count(&self) -> usize {
        self.index.enumerate().len()
    }

    /// Number of renters in the block at `street` and `number`.
    pub fn renters_count(&self, street: &str, number: &str) -> Result<usize> {
        let id = BlockId::derive(street, number);
        Ok(self.repository.get(&id)?.renter_count())
    }

    /// First indexed block without renters.
    ///
    /// Blocks that fail to load are logged and skipped; their ids are listed
    /// in [`RegistryError::NoEmptyBlockFound`] if no empty block turns up.
    pub fn find_empty_block(&self) -> Result<Block> {
        let mut unreadable = Vec::new();
        for id in self.index.enumerate() {
            match self.repository.get(&id) {
                Ok(block) if block.is_empty() => return Ok(block),
                Ok(_) => {}
                Err(e) => {
                    warn!(block_id = %id, error = %e, "skipping unreadable block");
                    unreadable.push(id);
                }
            }
        }
        Err(RegistryError::NoEmptyBlockFound { unreadable })
    }

    /// Index every decodable block record the index does not know about.
    ///
    /// Returns how many records were adopted. Records that fail to decode
    /// are logged and left alone. A damaged index record is always
    /// rewritten, even when nothing is adopted.
    pub fn repair_index(&mut self) -> Result<usize> {
        let mut adopted = 0;
        for id in self.repository.stored_ids()? {
            if self.index.contains(&id) {
                continue;
            }
            match self.repository.get(&id) {
                Ok(_) => {
                    self.index.add(&id)?;
                    adopted += 1;
                    warn!(block_id = %id, "adopted unindexed block record");
                }
                Err(e) => warn!(block_id = %id, error = %e, "leaving undecodable record unindexed"),
            }
        }
        if self.index.is_damaged() {
            self.index.rewrite()?;
        }
        info!(adopted, blocks = self.index.len(), "index repair complete");
        Ok(adopted)
    }

    /// Ids currently in the index.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.index.enumerate()
    }
}
