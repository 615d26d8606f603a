//! Content model for revmeta.
//!
//! Defines the types the storage layer and the synchronizer agree on:
//! - [`ContentItem`] / [`ItemKind`]: canonical items, their snapshots, and autosave drafts
//! - [`DraftFields`]: decoded field values submitted with an autosave
//! - [`MetaRead`]: the result of a single- or multi-value metadata read
//! - [`TrackedKeyProvider`]: extension point deciding which metadata keys are versioned

mod fields;
mod item;
mod keys;

pub use fields::{DraftFields, MetaRead};
pub use item::{ContentItem, ItemKind};
pub use keys::{StaticKeys, TrackedKeyProvider};
