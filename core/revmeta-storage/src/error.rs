//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Item not found.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<revmeta_types::Error> for StorageError {
    fn from(err: revmeta_types::Error) -> Self {
        match err {
            revmeta_types::Error::Serialization(e) => Self::Serialization(e),
            other => Self::InvalidData(other.to_string()),
        }
    }
}
