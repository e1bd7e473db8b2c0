use serde::{Deserialize, Serialize};

use blockreg_types::BlockId;

use crate::error::{RegistryError, Result};

/// Ledger key holding the serialized existence index.
pub const DEFAULT_INDEX_KEY: &str = "blocksIdCache";

/// When the existence index is re-read from the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexReload {
    /// Reload at the top of every invocation. Safe when other processes
    /// write to the same ledger.
    #[default]
    PerInvocation,
    /// Load once when the registry is opened. Only correct when this
    /// process is the sole writer for its whole lifetime.
    OnOpen,
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reserved ledger key for the existence index.
    pub index_key: String,
    /// Index reload policy.
    pub index_reload: IndexReload,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_key: DEFAULT_INDEX_KEY.to_string(),
            index_reload: IndexReload::default(),
        }
    }
}

impl RegistryConfig {
    /// Check that the index key cannot be mistaken for a block id.
    pub fn validate(&self) -> Result<()> {
        if self.index_key.is_empty() {
            return Err(RegistryError::InvalidConfig(
                "index key must not be empty".into(),
            ));
        }
        if BlockId::parse(&self.index_key).is_ok() {
            return Err(RegistryError::InvalidConfig(format!(
                "index key {:?} collides with the block id space",
                self.index_key
            )));
        }
        Ok(())
    }
}
