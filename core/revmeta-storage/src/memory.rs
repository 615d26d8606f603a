//! In-process store.

use crate::{ContentStore, MetadataStore, StorageError, StorageResult};
use revmeta_model::{ContentItem, ItemKind};
use revmeta_types::{ItemId, MetaValue, SnapshotStamp};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

struct MetaRow {
    owner: ItemId,
    key: String,
    value: MetaValue,
}

#[derive(Default)]
struct State {
    items: HashMap<ItemId, ContentItem>,
    /// Insertion order doubles as value order.
    meta: Vec<MetaRow>,
    last_stamp: Option<SnapshotStamp>,
}

impl State {
    fn require(&self, owner: &ItemId) -> StorageResult<()> {
        if self.items.contains_key(owner) {
            Ok(())
        } else {
            Err(StorageError::NotFound(owner.to_string()))
        }
    }
}

/// Items and metadata held in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for MemoryStore {
    fn insert_item(&self, item: &ContentItem) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.items.contains_key(&item.id) {
            return Err(StorageError::InvalidData(format!(
                "item already exists: {}",
                item.id
            )));
        }
        if let Some(parent) = &item.parent {
            state.require(parent)?;
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    fn update_item(&self, item: &ContentItem) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StorageError::NotFound(item.id.to_string()))?;
        stored.title.clone_from(&item.title);
        stored.body.clone_from(&item.body);
        stored.modified_at = item.modified_at;
        Ok(())
    }

    fn get_item(&self, id: &ItemId) -> StorageResult<Option<ContentItem>> {
        Ok(self.state.lock().unwrap().items.get(id).cloned())
    }

    fn snapshots(&self, parent: &ItemId) -> StorageResult<Vec<ContentItem>> {
        let state = self.state.lock().unwrap();
        let mut snapshots: Vec<ContentItem> = state
            .items
            .values()
            .filter(|i| i.kind == ItemKind::Snapshot && i.parent.as_ref() == Some(parent))
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(snapshots)
    }

    fn draft_for(&self, parent: &ItemId) -> StorageResult<Option<ContentItem>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .values()
            .find(|i| i.kind == ItemKind::Draft && i.parent.as_ref() == Some(parent))
            .cloned())
    }

    fn delete_item(&self, id: &ItemId) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.require(id)?;
        let doomed: Vec<ItemId> = state
            .items
            .values()
            .filter(|i| i.id == *id || i.parent.as_ref() == Some(id))
            .map(|i| i.id)
            .collect();
        for victim in &doomed {
            state.items.remove(victim);
        }
        state.meta.retain(|row| !doomed.contains(&row.owner));
        debug!("deleted item {} ({} items removed)", id, doomed.len());
        Ok(())
    }

    fn next_stamp(&self) -> StorageResult<SnapshotStamp> {
        let mut state = self.state.lock().unwrap();
        let stamp = SnapshotStamp::after(state.last_stamp);
        state.last_stamp = Some(stamp);
        Ok(stamp)
    }
}

impl MetadataStore for MemoryStore {
    fn meta_keys(&self, owner: &ItemId) -> StorageResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut keys: Vec<String> = Vec::new();
        for row in state.meta.iter().filter(|r| r.owner == *owner) {
            if !keys.contains(&row.key) {
                keys.push(row.key.clone());
            }
        }
        Ok(keys)
    }

    fn get_meta(&self, owner: &ItemId, key: &str) -> StorageResult<Vec<MetaValue>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .meta
            .iter()
            .filter(|r| r.owner == *owner && r.key == key)
            .map(|r| r.value.clone())
            .collect())
    }

    fn add_meta(&self, owner: &ItemId, key: &str, value: &MetaValue) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.require(owner)?;
        state.meta.push(MetaRow {
            owner: *owner,
            key: key.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn delete_meta(&self, owner: &ItemId, key: &str) -> StorageResult<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.meta.len();
        state.meta.retain(|r| !(r.owner == *owner && r.key == key));
        Ok(before - state.meta.len())
    }

    fn replace_meta_value(
        &self,
        owner: &ItemId,
        key: &str,
        previous: &MetaValue,
        value: &MetaValue,
    ) -> StorageResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.require(owner)?;
        let mut replaced = 0;
        for row in state
            .meta
            .iter_mut()
            .filter(|r| r.owner == *owner && r.key == key && r.value == *previous)
        {
            row.value = value.clone();
            replaced += 1;
        }
        Ok(replaced)
    }
}
