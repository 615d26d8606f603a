//! Metadata revisioning for content snapshots.
//!
//! A host keeps point-in-time snapshots of an item's content. This crate
//! extends those snapshots to a configurable set of metadata keys:
//!
//! - [`MetaRevisionSync`] copies tracked values onto each new snapshot,
//!   reinstates them on restore, mirrors submitted fields into autosave
//!   drafts, flags tracked changes as snapshot-worthy, and serves preview
//!   reads from the draft.
//! - [`KeyRegistry`] decides which keys are tracked, re-evaluated per event.
//! - [`RevisionEngine`] is a ready-made host pipeline that fires the
//!   [`RevisionHooks`] at each lifecycle step.
//! - [`RevisionConfig`] loads tracked keys from `revisions.toml`.

mod config;
mod engine;
mod error;
pub mod form;
mod hooks;
mod registry;
mod synchronizer;

pub use config::{ChangeDetection, RevisionConfig};
pub use engine::{DraftUpdate, ItemUpdate, RevisionEngine};
pub use error::{SyncError, SyncResult};
pub use hooks::RevisionHooks;
pub use registry::{DEFAULT_PRIORITY, KeyRegistry, ProviderId};
pub use synchronizer::{DraftFieldOutcome, MetaRevisionSync};
