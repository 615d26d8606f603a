//! Storage layer for revmeta.
//!
//! Provides the host-side stores the synchronizer works through:
//!
//! - [`ContentStore`]: canonical items, their snapshots and autosave drafts
//! - [`MetadataStore`]: ordered, multi-valued key/value metadata per item
//!
//! Two implementations are shipped. [`MemoryStore`] keeps everything in
//! process and is what most tests use; [`SqliteStore`] persists to a SQLite
//! file. Both accept any item (canonical, snapshot or draft) as a metadata
//! owner and reject owners that do not exist.

mod error;
mod memory;
mod sqlite;
mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{ContentStore, MetadataStore};
