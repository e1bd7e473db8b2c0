use thiserror::Error;

use blockreg_store::StoreError;
use blockreg_types::{BlockId, TypeError};

/// Errors that can terminate a registry invocation.
///
/// None of these are retried internally; the caller decides whether to
/// resubmit.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Fewer arguments were supplied than the operation requires.
    #[error("not enough arguments for {operation}: {required} required, {supplied} supplied")]
    ArgumentCount {
        operation: String,
        required: usize,
        supplied: usize,
    },

    /// No operation is registered under the requested name.
    #[error("no function {0} implemented")]
    UnknownOperation(String),

    /// A block with this id has already been created.
    #[error("block {0} already exists")]
    BlockAlreadyExists(BlockId),

    /// No block with this id is registered.
    #[error("no block {0} registered")]
    BlockNotFound(BlockId),

    /// The block has no renter with the requested name.
    #[error("could not find renter {name} in block {block}")]
    RenterNotFound { block: BlockId, name: String },

    /// Every readable indexed block has at least one renter.
    #[error("no empty block found ({} unreadable blocks skipped)", .unreadable.len())]
    NoEmptyBlockFound { unreadable: Vec<BlockId> },

    /// The ledger store failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The registry configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<TypeError> for RegistryError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::Serialization(msg) => RegistryError::Serialization(msg),
            other => RegistryError::Serialization(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Serialization(err.to_string())
    }
}

/// Convenience type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_serialization_error_is_not_prefixed_twice() {
        let err = RegistryError::from(TypeError::Serialization("expected value".into()));
        assert_eq!(err.to_string(), "serialization error: expected value");
    }

    #[test]
    fn invalid_id_keeps_its_description() {
        let err = RegistryError::from(TypeError::InvalidBlockId {
            id: "Oak".into(),
            reason: "missing separator".into(),
        });
        assert_eq!(
            err.to_string(),
            "serialization error: invalid block id \"Oak\": missing separator"
        );
    }
}
