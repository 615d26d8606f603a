//! Error types for the synchronization layer.

use revmeta_storage::StorageError;
use revmeta_types::ItemId;
use thiserror::Error;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing metadata.
///
/// Store faults pass through untouched; an empty tracked-key set or a
/// snapshot without values for a key is never an error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Failure reported by the underlying store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A metadata value could not be encoded or decoded.
    #[error("value error: {0}")]
    Value(#[from] revmeta_types::Error),

    /// Item not found.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// The item is not a snapshot with a parent.
    #[error("item {0} is not a snapshot")]
    NotASnapshot(ItemId),

    /// The item is not a canonical item.
    #[error("item {0} is not a canonical item")]
    NotCanonical(ItemId),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}
