//! Revision engine: the host pipeline that drives the lifecycle hooks.
//!
//! The engine owns item writes (create, update, snapshot, restore, autosave)
//! and fires [`RevisionHooks`] at each step. Metadata policy lives entirely in
//! the hooks; the engine only decides when content alone warrants a snapshot.

use crate::config::RevisionConfig;
use crate::error::{SyncError, SyncResult};
use crate::hooks::RevisionHooks;
use crate::registry::KeyRegistry;
use crate::synchronizer::MetaRevisionSync;
use revmeta_model::{ContentItem, DraftFields, ItemKind, MetaRead};
use revmeta_storage::{ContentStore, MetadataStore};
use revmeta_types::{ItemId, MetaValue};
use std::sync::Arc;
use tracing::{debug, info};

/// Changes to apply to a canonical item.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl ItemUpdate {
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }
}

/// An autosave submission: draft content plus decoded field values.
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub fields: DraftFields,
}

/// Drives item revisions and notifies hooks.
pub struct RevisionEngine<S> {
    store: Arc<S>,
    hooks: Vec<Arc<dyn RevisionHooks>>,
}

impl<S> RevisionEngine<S>
where
    S: ContentStore + MetadataStore + 'static,
{
    /// An engine with no hooks: snapshots carry content only.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    /// An engine with metadata revisioning driven by `registry`.
    pub fn with_registry(
        store: Arc<S>,
        registry: Arc<KeyRegistry>,
        config: &RevisionConfig,
    ) -> Self {
        let sync = MetaRevisionSync::new(Arc::clone(&store), registry)
            .with_change_detection(config.change_detection);
        let mut engine = Self::new(store);
        engine.add_hooks(Arc::new(sync));
        engine
    }

    /// An engine with metadata revisioning set up from `config`.
    ///
    /// Returns the registry as well so callers can track more keys later.
    pub fn from_config(store: Arc<S>, config: &RevisionConfig) -> (Self, Arc<KeyRegistry>) {
        let registry = Arc::new(config.registry());
        let engine = Self::with_registry(store, Arc::clone(&registry), config);
        (engine, registry)
    }

    /// Appends a hook implementation; hooks run in the order added.
    pub fn add_hooks(&mut self, hooks: Arc<dyn RevisionHooks>) {
        self.hooks.push(hooks);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn canonical(&self, id: &ItemId) -> SyncResult<ContentItem> {
        let item = self
            .store
            .get_item(id)?
            .ok_or(SyncError::NotFound(*id))?;
        if item.kind != ItemKind::Canonical {
            return Err(SyncError::NotCanonical(*id));
        }
        Ok(item)
    }

    // ── Items ────────────────────────────────────────────────────

    /// Creates a canonical item. No snapshot is taken.
    pub fn create_item(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> SyncResult<ContentItem> {
        let item = ContentItem::canonical(title, body, self.store.next_stamp()?);
        self.store.insert_item(&item)?;
        debug!("created item {}", item.id);
        Ok(item)
    }

    /// Applies `update` and takes a snapshot if anything changed.
    pub fn update_item(&self, id: &ItemId, update: ItemUpdate) -> SyncResult<Option<ItemId>> {
        let mut item = self.canonical(id)?;
        if let Some(title) = update.title {
            item.title = title;
        }
        if let Some(body) = update.body {
            item.body = body;
        }
        item.modified_at = self.store.next_stamp()?.wall_time() as i64;
        self.store.update_item(&item)?;
        self.save_snapshot(id)
    }

    /// Takes a snapshot of `id` when its content or any hook says it changed
    /// since the last snapshot. The first save of an item always snapshots.
    pub fn save_snapshot(&self, id: &ItemId) -> SyncResult<Option<ItemId>> {
        let item = self.canonical(id)?;

        if let Some(last) = self.store.latest_snapshot(id)? {
            let mut changed = item.content_differs(&last);
            for hooks in &self.hooks {
                changed = hooks.has_changed(changed, &last, &item)? || changed;
            }
            if !changed {
                debug!("item {} unchanged since snapshot {}", id, last.id);
                return Ok(None);
            }
        }

        let snapshot = item.snapshot_of(self.store.next_stamp()?);
        self.store.insert_item(&snapshot)?;
        for hooks in &self.hooks {
            hooks.snapshot_created(&snapshot, &item)?;
        }
        info!("snapshot {} taken of item {}", snapshot.id, id);
        Ok(Some(snapshot.id))
    }

    /// Resets the snapshot's parent to the snapshot's content, then snapshots
    /// the parent. Returns the restored parent.
    pub fn restore(&self, snapshot_id: &ItemId) -> SyncResult<ContentItem> {
        let snapshot = self
            .store
            .get_item(snapshot_id)?
            .ok_or(SyncError::NotFound(*snapshot_id))?;
        let parent_id = match (snapshot.kind, snapshot.parent) {
            (ItemKind::Snapshot, Some(parent)) => parent,
            _ => return Err(SyncError::NotASnapshot(*snapshot_id)),
        };

        let mut target = self.canonical(&parent_id)?;
        target.title.clone_from(&snapshot.title);
        target.body.clone_from(&snapshot.body);
        target.modified_at = self.store.next_stamp()?.wall_time() as i64;
        self.store.update_item(&target)?;

        for hooks in &self.hooks {
            hooks.restored(&target, &snapshot)?;
        }
        info!("restored item {} from snapshot {}", parent_id, snapshot_id);

        self.save_snapshot(&parent_id)?;
        Ok(target)
    }

    /// Creates or refreshes the item's autosave draft.
    pub fn autosave(&self, id: &ItemId, update: DraftUpdate) -> SyncResult<ContentItem> {
        let item = self.canonical(id)?;
        let stamp = self.store.next_stamp()?;

        let mut draft = match self.store.draft_for(id)? {
            Some(existing) => existing,
            None => {
                let draft = item.draft_of(stamp);
                self.store.insert_item(&draft)?;
                debug!("created draft {} for item {}", draft.id, id);
                draft
            }
        };
        if let Some(title) = update.title {
            draft.title = title;
        }
        if let Some(body) = update.body {
            draft.body = body;
        }
        draft.modified_at = stamp.wall_time() as i64;
        self.store.update_item(&draft)?;

        for hooks in &self.hooks {
            hooks.draft_saved(&draft, &update.fields)?;
        }
        Ok(draft)
    }

    /// Snapshots of `id`, newest first.
    pub fn snapshots(&self, id: &ItemId) -> SyncResult<Vec<ContentItem>> {
        Ok(self.store.snapshots(id)?)
    }

    pub fn get_item(&self, id: &ItemId) -> SyncResult<Option<ContentItem>> {
        Ok(self.store.get_item(id)?)
    }

    /// Removes the item with its snapshots, draft and metadata.
    pub fn delete_item(&self, id: &ItemId) -> SyncResult<()> {
        self.store.delete_item(id)?;
        info!("deleted item {}", id);
        Ok(())
    }

    // ── Metadata ─────────────────────────────────────────────────

    /// Reads metadata, letting hooks redirect the read while `rendering`
    /// is being previewed.
    pub fn read_meta(
        &self,
        rendering: Option<&ContentItem>,
        id: &ItemId,
        key: &str,
        single: bool,
    ) -> SyncResult<MetaRead> {
        for hooks in &self.hooks {
            if let Some(read) = hooks.preview_meta(rendering, id, key, single)? {
                return Ok(read);
            }
        }
        Ok(MetaRead::from_values(self.store.get_meta(id, key)?, single))
    }

    /// Every value stored under `key`, straight from the store.
    pub fn get_meta(&self, id: &ItemId, key: &str) -> SyncResult<Vec<MetaValue>> {
        Ok(self.store.get_meta(id, key)?)
    }

    /// Appends a value.
    pub fn add_meta(&self, id: &ItemId, key: &str, value: impl Into<MetaValue>) -> SyncResult<()> {
        self.store.add_meta(id, key, &value.into())?;
        Ok(())
    }

    /// Sets a value.
    ///
    /// With `previous`, only values equal to it are replaced, in place.
    /// Without, every value under `key` is replaced by the single `value`.
    pub fn update_meta(
        &self,
        id: &ItemId,
        key: &str,
        value: impl Into<MetaValue>,
        previous: Option<&MetaValue>,
    ) -> SyncResult<()> {
        let value = value.into();
        match previous {
            Some(previous) => {
                self.store.replace_meta_value(id, key, previous, &value)?;
            }
            None => {
                self.store.delete_meta(id, key)?;
                self.store.add_meta(id, key, &value)?;
            }
        }
        Ok(())
    }

    /// Removes every value under `key`.
    pub fn delete_meta(&self, id: &ItemId, key: &str) -> SyncResult<usize> {
        Ok(self.store.delete_meta(id, key)?)
    }
}
