use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid block id {id:?}: {reason}")]
    InvalidBlockId { id: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
