//! Metadata revision synchronizer.
//!
//! Copies the values of tracked metadata keys between an item and its
//! snapshots and drafts. It owns no state beyond what it writes through the
//! store, and re-reads the tracked key set on every call.

use crate::config::ChangeDetection;
use crate::error::{SyncError, SyncResult};
use crate::hooks::RevisionHooks;
use crate::registry::KeyRegistry;
use revmeta_model::{ContentItem, DraftFields, MetaRead};
use revmeta_storage::{ContentStore, MetadataStore};
use revmeta_types::{ItemId, MetaValue};
use std::sync::Arc;
use tracing::{debug, info};

/// What happened to one tracked key during a draft field sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftFieldOutcome {
    /// Stored and submitted values match; nothing written.
    Unchanged,
    /// Old value removed and the submitted one stored.
    Updated,
    /// Submitted value was empty; old value removed, nothing stored.
    Cleared,
}

/// Keeps tracked metadata in step with snapshots, restores and drafts.
pub struct MetaRevisionSync<S> {
    store: Arc<S>,
    registry: Arc<KeyRegistry>,
    change_detection: ChangeDetection,
}

impl<S> MetaRevisionSync<S>
where
    S: ContentStore + MetadataStore,
{
    pub fn new(store: Arc<S>, registry: Arc<KeyRegistry>) -> Self {
        Self {
            store,
            registry,
            change_detection: ChangeDetection::default(),
        }
    }

    /// Sets how value lists are compared by [`MetaRevisionSync::tracked_meta_changed`].
    pub fn with_change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    pub fn registry(&self) -> &Arc<KeyRegistry> {
        &self.registry
    }

    /// The keys eligible for synchronization right now.
    pub fn tracked_keys(&self) -> Vec<String> {
        self.registry.tracked_keys()
    }

    /// Appends every value of `key` on `from` to `to`. Returns the number of
    /// values copied.
    fn copy_key(&self, from: &ItemId, to: &ItemId, key: &str) -> SyncResult<usize> {
        let values = self.store.get_meta(from, key)?;
        for value in &values {
            self.store.add_meta(to, key, value)?;
        }
        Ok(values.len())
    }

    /// Copies the parent's tracked metadata onto a freshly written snapshot.
    ///
    /// Only keys actually present on the parent are copied, so a tracked key
    /// that was never set leaves nothing behind on the snapshot.
    pub fn on_snapshot_created(&self, snapshot: &ItemId, parent: &ItemId) -> SyncResult<usize> {
        let tracked = self.tracked_keys();
        if tracked.is_empty() {
            return Ok(0);
        }

        let mut copied = 0;
        for key in self.store.meta_keys(parent)? {
            if tracked.contains(&key) {
                copied += self.copy_key(parent, snapshot, &key)?;
            }
        }
        debug!("copied {} tracked values from {} to snapshot {}", copied, parent, snapshot);
        Ok(copied)
    }

    /// Replaces `target`'s tracked metadata with the snapshot's.
    ///
    /// Every tracked key is cleared on the target first, whether or not the
    /// snapshot holds values for it.
    pub fn on_restore(&self, target: &ItemId, snapshot: &ItemId) -> SyncResult<()> {
        let tracked = self.tracked_keys();
        for key in &tracked {
            self.store.delete_meta(target, key)?;
            self.copy_key(snapshot, target, key)?;
        }
        if !tracked.is_empty() {
            info!("restored {} tracked keys on {} from {}", tracked.len(), target, snapshot);
        }
        Ok(())
    }

    /// Mirrors submitted field values for tracked keys into an autosave draft.
    ///
    /// `fields` must already be decoded from the transport. Keys that were
    /// not submitted are left alone.
    pub fn on_draft_fields(
        &self,
        draft: &ItemId,
        fields: &DraftFields,
    ) -> SyncResult<Vec<(String, DraftFieldOutcome)>> {
        let mut outcomes = Vec::new();
        for key in self.tracked_keys() {
            let Some(incoming) = fields.get(&key) else {
                continue;
            };
            let stored = self.store.get_single_meta(draft, &key)?;
            let unchanged = match &stored {
                Some(current) => current == incoming,
                None => incoming.is_empty(),
            };
            let outcome = if unchanged {
                DraftFieldOutcome::Unchanged
            } else {
                self.store.delete_meta(draft, &key)?;
                if incoming.is_empty() {
                    DraftFieldOutcome::Cleared
                } else {
                    self.store.add_meta(draft, &key, incoming)?;
                    DraftFieldOutcome::Updated
                }
            };
            debug!("draft {} field {}: {:?}", draft, key, outcome);
            outcomes.push((key, outcome));
        }
        Ok(outcomes)
    }

    /// Whether any tracked key's values differ between `current` and the
    /// last snapshot. Returns `true` straight away if `verdict` already is.
    pub fn tracked_meta_changed(
        &self,
        verdict: bool,
        current: &ItemId,
        last_snapshot: &ItemId,
    ) -> SyncResult<bool> {
        if verdict {
            return Ok(true);
        }
        for key in self.tracked_keys() {
            let now = self.store.get_meta(current, &key)?;
            let then = self.store.get_meta(last_snapshot, &key)?;
            if lists_differ(&now, &then, self.change_detection)? {
                debug!("tracked key {} changed on {}", key, current);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Serves a metadata read from the autosave draft while previewing.
    ///
    /// Applies only when `object` is the item being rendered, that item is not
    /// a snapshot, the key is tracked, and a draft exists. Everything else
    /// returns `None` and falls through to the store.
    pub fn preview_lookup(
        &self,
        rendering: Option<&ContentItem>,
        object: &ItemId,
        key: &str,
        single: bool,
    ) -> SyncResult<Option<MetaRead>> {
        let Some(item) = rendering else {
            return Ok(None);
        };
        if item.id != *object || item.is_snapshot() || !self.registry.is_tracked(key) {
            return Ok(None);
        }
        let Some(draft) = self.store.draft_for(&item.id)? else {
            return Ok(None);
        };
        let values = self.store.get_meta(&draft.id, key)?;
        debug!("preview read of {} on {} served from draft {}", key, object, draft.id);
        Ok(Some(MetaRead::from_values(values, single)))
    }
}

fn lists_differ(a: &[MetaValue], b: &[MetaValue], mode: ChangeDetection) -> SyncResult<bool> {
    match mode {
        ChangeDetection::Ordered => Ok(a != b),
        ChangeDetection::Unordered => {
            if a.len() != b.len() {
                return Ok(true);
            }
            let mut left = a.iter().map(MetaValue::encode).collect::<Result<Vec<_>, _>>()?;
            let mut right = b.iter().map(MetaValue::encode).collect::<Result<Vec<_>, _>>()?;
            left.sort();
            right.sort();
            Ok(left != right)
        }
    }
}

impl<S> RevisionHooks for MetaRevisionSync<S>
where
    S: ContentStore + MetadataStore,
{
    fn snapshot_created(&self, snapshot: &ContentItem, parent: &ContentItem) -> SyncResult<()> {
        self.on_snapshot_created(&snapshot.id, &parent.id)?;
        Ok(())
    }

    fn restored(&self, target: &ContentItem, snapshot: &ContentItem) -> SyncResult<()> {
        if !snapshot.is_snapshot() {
            return Err(SyncError::NotASnapshot(snapshot.id));
        }
        self.on_restore(&target.id, &snapshot.id)
    }

    fn draft_saved(&self, draft: &ContentItem, fields: &DraftFields) -> SyncResult<()> {
        self.on_draft_fields(&draft.id, fields)?;
        Ok(())
    }

    fn has_changed(
        &self,
        verdict: bool,
        last_snapshot: &ContentItem,
        current: &ContentItem,
    ) -> SyncResult<bool> {
        self.tracked_meta_changed(verdict, &current.id, &last_snapshot.id)
    }

    fn preview_meta(
        &self,
        rendering: Option<&ContentItem>,
        object: &ItemId,
        key: &str,
        single: bool,
    ) -> SyncResult<Option<MetaRead>> {
        self.preview_lookup(rendering, object, key, single)
    }
}
