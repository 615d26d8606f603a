use crate::{StorageError, StorageResult};
use revmeta_model::ContentItem;
use revmeta_types::{ItemId, MetaValue, SnapshotStamp};

/// Item persistence: canonical items, snapshots and drafts.
pub trait ContentStore: Send + Sync {
    /// Inserts a new item. Fails if the id is taken.
    fn insert_item(&self, item: &ContentItem) -> StorageResult<()>;

    /// Overwrites an existing item's title, body and modification time.
    fn update_item(&self, item: &ContentItem) -> StorageResult<()>;

    fn get_item(&self, id: &ItemId) -> StorageResult<Option<ContentItem>>;

    /// Snapshots owned by `parent`, newest first.
    fn snapshots(&self, parent: &ItemId) -> StorageResult<Vec<ContentItem>>;

    /// The autosave draft owned by `parent`, if one exists.
    fn draft_for(&self, parent: &ItemId) -> StorageResult<Option<ContentItem>>;

    /// Removes an item together with its metadata and every item it owns.
    fn delete_item(&self, id: &ItemId) -> StorageResult<()>;

    /// Issues a creation stamp strictly after every stamp issued before.
    fn next_stamp(&self) -> StorageResult<SnapshotStamp>;

    /// Like [`ContentStore::get_item`], but a missing item is an error.
    fn item(&self, id: &ItemId) -> StorageResult<ContentItem> {
        self.get_item(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// The most recent snapshot of `parent`.
    fn latest_snapshot(&self, parent: &ItemId) -> StorageResult<Option<ContentItem>> {
        Ok(self.snapshots(parent)?.into_iter().next())
    }
}

/// Multi-valued metadata keyed by owner item.
///
/// Values under one key keep insertion order. Every method accepts any item
/// id as owner; writes to an owner that does not exist fail with
/// [`StorageError::NotFound`].
pub trait MetadataStore: Send + Sync {
    /// Distinct keys present on `owner`, in order of first insertion.
    fn meta_keys(&self, owner: &ItemId) -> StorageResult<Vec<String>>;

    /// Every value stored under `key`, in insertion order.
    fn get_meta(&self, owner: &ItemId, key: &str) -> StorageResult<Vec<MetaValue>>;

    /// Appends a value under `key`.
    fn add_meta(&self, owner: &ItemId, key: &str, value: &MetaValue) -> StorageResult<()>;

    /// Removes every value under `key`. Returns how many were removed.
    fn delete_meta(&self, owner: &ItemId, key: &str) -> StorageResult<usize>;

    /// Replaces, in place, each value equal to `previous` with `value`.
    /// Returns how many values were replaced.
    fn replace_meta_value(
        &self,
        owner: &ItemId,
        key: &str,
        previous: &MetaValue,
        value: &MetaValue,
    ) -> StorageResult<usize>;

    /// The first value under `key`, if any.
    fn get_single_meta(&self, owner: &ItemId, key: &str) -> StorageResult<Option<MetaValue>> {
        Ok(self.get_meta(owner, key)?.into_iter().next())
    }
}
