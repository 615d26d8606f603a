//! Core type definitions for revmeta.
//!
//! This crate defines the small vocabulary shared by every other crate:
//! - Item identifiers (UUID v7), used for canonical items, snapshots and drafts alike
//! - Metadata values, which may be plain text or JSON composites
//! - Snapshot stamps that give snapshots a strict creation order

mod ids;
mod stamp;
mod value;

pub use ids::ItemId;
pub use stamp::SnapshotStamp;
pub use value::MetaValue;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid item id: {0}")]
    InvalidId(#[from] uuid::Error),
}
