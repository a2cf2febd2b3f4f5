use thiserror::Error;

use crate::Fr;

/// Errors from tree store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure of the underlying environment or transaction
    #[error("storage error: {0}")]
    StorageError(#[from] mtree_storage::Error),
    /// Reference count change on a node that is not stored
    #[error("node {0} not found")]
    NodeNotFound(Fr),
    /// Stored value cannot be decoded or breaks a record invariant
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    /// Value cannot be encoded
    #[error("encoding error: {0}")]
    EncodingError(String),
}
