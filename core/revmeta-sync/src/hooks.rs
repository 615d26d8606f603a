use crate::error::SyncResult;
use revmeta_model::{ContentItem, DraftFields, MetaRead};
use revmeta_types::ItemId;

/// Revision lifecycle events, one method per event.
///
/// The engine calls every registered implementation in registration order.
/// All methods default to doing nothing, so implementors override only the
/// events they care about.
pub trait RevisionHooks: Send + Sync {
    /// A snapshot of `parent` has just been written.
    fn snapshot_created(&self, snapshot: &ContentItem, parent: &ContentItem) -> SyncResult<()> {
        let _ = (snapshot, parent);
        Ok(())
    }

    /// `target`'s content has been reset from `snapshot`.
    fn restored(&self, target: &ContentItem, snapshot: &ContentItem) -> SyncResult<()> {
        let _ = (target, snapshot);
        Ok(())
    }

    /// An autosave draft was written along with submitted field values.
    fn draft_saved(&self, draft: &ContentItem, fields: &DraftFields) -> SyncResult<()> {
        let _ = (draft, fields);
        Ok(())
    }

    /// Decides whether a new snapshot of `current` is warranted.
    ///
    /// `verdict` is the decision so far. Implementations may only turn
    /// `false` into `true`.
    fn has_changed(
        &self,
        verdict: bool,
        last_snapshot: &ContentItem,
        current: &ContentItem,
    ) -> SyncResult<bool> {
        let _ = (last_snapshot, current);
        Ok(verdict)
    }

    /// Overrides a metadata read. `None` leaves the read to the store.
    ///
    /// `rendering` is the item currently being rendered, if any.
    fn preview_meta(
        &self,
        rendering: Option<&ContentItem>,
        object: &ItemId,
        key: &str,
        single: bool,
    ) -> SyncResult<Option<MetaRead>> {
        let _ = (rendering, object, key, single);
        Ok(None)
    }
}
