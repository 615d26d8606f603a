use pretty_assertions::assert_eq;
use revmeta_model::{ContentItem, DraftFields, MetaRead, StaticKeys};
use revmeta_storage::{ContentStore, MemoryStore, MetadataStore, SqliteStore};
use revmeta_sync::{
    form, DraftUpdate, ItemUpdate, RevisionConfig, RevisionEngine, RevisionHooks, SyncError,
    SyncResult,
};
use revmeta_types::{ItemId, MetaValue};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const KEY: &str = "meta_revision_test";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine() -> (RevisionEngine<MemoryStore>, Arc<revmeta_sync::KeyRegistry>) {
    RevisionEngine::from_config(Arc::new(MemoryStore::new()), &RevisionConfig::default())
}

fn single<S: ContentStore + MetadataStore + 'static>(
    engine: &RevisionEngine<S>,
    id: &ItemId,
) -> Option<MetaValue> {
    engine.read_meta(None, id, KEY, true).unwrap().first().cloned()
}

/// The snapshot before the newest one.
fn previous_snapshot<S: ContentStore + MetadataStore + 'static>(
    engine: &RevisionEngine<S>,
    id: &ItemId,
) -> ItemId {
    engine.snapshots(id).unwrap()[1].id
}

fn track(registry: &revmeta_sync::KeyRegistry) {
    registry.register(StaticKeys::new([KEY]));
}

// ── Snapshot decisions ───────────────────────────────────────────

#[test]
fn create_takes_no_snapshot_and_first_update_does() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    assert!(engine.snapshots(&item.id).unwrap().is_empty());

    let snap = engine.update_item(&item.id, ItemUpdate::body("first")).unwrap();
    assert!(snap.is_some());
    assert_eq!(engine.snapshots(&item.id).unwrap().len(), 1);
}

#[test]
fn unchanged_update_takes_no_snapshot() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    engine.update_item(&item.id, ItemUpdate::body("first")).unwrap();
    assert_eq!(engine.update_item(&item.id, ItemUpdate::default()).unwrap(), None);
    assert_eq!(engine.snapshots(&item.id).unwrap().len(), 1);
}

#[test]
fn tracked_meta_change_alone_takes_snapshot() {
    let (engine, registry) = engine();
    track(&registry);
    let item = engine.create_item("Doc", "").unwrap();
    engine.update_item(&item.id, ItemUpdate::body("first")).unwrap();

    engine.update_meta(&item.id, KEY, "changed", None).unwrap();
    let snap = engine.update_item(&item.id, ItemUpdate::default()).unwrap().unwrap();
    assert_eq!(engine.get_meta(&snap, KEY).unwrap(), vec![MetaValue::text("changed")]);
}

#[test]
fn untracked_meta_change_alone_takes_no_snapshot() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    engine.update_item(&item.id, ItemUpdate::body("first")).unwrap();
    engine.update_meta(&item.id, KEY, "changed", None).unwrap();
    assert_eq!(engine.update_item(&item.id, ItemUpdate::default()).unwrap(), None);
}

#[test]
fn color_scenario() {
    let (engine, registry) = engine();
    registry.register(StaticKeys::new(["color"]));
    let item = engine.create_item("Doc", "").unwrap();

    engine.update_meta(&item.id, "color", "red", None).unwrap();
    let s1 = engine.update_item(&item.id, ItemUpdate::body("v1")).unwrap().unwrap();
    engine.update_meta(&item.id, "color", "blue", None).unwrap();
    let s2 = engine.update_item(&item.id, ItemUpdate::body("v2")).unwrap().unwrap();

    assert_eq!(engine.get_meta(&s1, "color").unwrap(), vec![MetaValue::text("red")]);
    assert_eq!(engine.get_meta(&s2, "color").unwrap(), vec![MetaValue::text("blue")]);

    let restored = engine.restore(&s1).unwrap();
    assert_eq!(restored.body, "v1");
    assert_eq!(engine.get_meta(&item.id, "color").unwrap(), vec![MetaValue::text("red")]);
}

// ── Full lifecycle, mirroring the plugin's acceptance suite ───────

fn full_lifecycle<S: ContentStore + MetadataStore + 'static>(
    engine: RevisionEngine<S>,
    registry: Arc<revmeta_sync::KeyRegistry>,
) {
    let id = engine.create_item("Post", "").unwrap().id;
    engine.update_item(&id, ItemUpdate::body("some initial content")).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 1);

    // Untracked meta is not revisioned.
    engine.update_meta(&id, KEY, "original", None).unwrap();
    engine.update_item(&id, ItemUpdate::body("some more content")).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 2);

    engine.update_meta(&id, KEY, "update1", None).unwrap();
    engine.update_item(&id, ItemUpdate::body("some updated content")).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 3);

    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 4);
    assert_eq!(single(&engine, &id), Some("update1".into()));

    // Tracked meta is revisioned, and alone forces a snapshot.
    engine.update_meta(&id, KEY, "update2", None).unwrap();
    track(&registry);
    engine.update_item(&id, ItemUpdate::body("more updated content")).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 5);

    engine.update_meta(&id, KEY, "update3", None).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    assert_eq!(engine.snapshots(&id).unwrap().len(), 6);
    assert_eq!(single(&engine, &id), Some("update3".into()));

    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    assert_eq!(single(&engine, &id), Some("update2".into()));

    // A blank value is restored as blank.
    engine.update_meta(&id, KEY, "", None).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    engine.update_meta(&id, KEY, "update 4", None).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    assert_eq!(single(&engine, &id), Some("".into()));

    // Once untracked, restore leaves the key alone.
    registry.clear();
    engine.update_meta(&id, KEY, "update 5", None).unwrap();
    engine.update_item(&id, ItemUpdate::body("changed content")).unwrap();
    engine.update_meta(&id, KEY, "update 6", None).unwrap();
    engine.update_item(&id, ItemUpdate::body("go updated content")).unwrap();
    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    assert_eq!(single(&engine, &id), Some("update 6".into()));

    // Multiple values round-trip in order.
    track(&registry);
    engine.update_meta(&id, KEY, "update 7", None).unwrap();
    engine.add_meta(&id, KEY, "update 7 number 2").unwrap();
    engine.add_meta(&id, KEY, "update 7 number 3").unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();

    for (old, new) in [
        ("update 7", "update 8"),
        ("update 7 number 2", "update 8 number 2"),
        ("update 7 number 3", "update 8 number 3"),
    ] {
        engine.update_meta(&id, KEY, new, Some(&old.into())).unwrap();
    }
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    assert_eq!(
        engine.get_meta(&id, KEY).unwrap(),
        vec![
            MetaValue::text("update 7"),
            MetaValue::text("update 7 number 2"),
            MetaValue::text("update 7 number 3"),
        ]
    );

    // Composite values round-trip.
    let composite = MetaValue::json(json!({
        "a": ["1", "2", "3"],
        "b": "ok",
        "c": { "multi": ["a", "b", "c"], "not": "ok" }
    }));
    engine.delete_meta(&id, KEY).unwrap();
    engine.update_meta(&id, KEY, composite.clone(), None).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    engine.update_meta(&id, KEY, "", None).unwrap();
    engine.update_item(&id, ItemUpdate::default()).unwrap();
    engine.restore(&previous_snapshot(&engine, &id)).unwrap();
    assert_eq!(engine.get_meta(&id, KEY).unwrap(), vec![composite]);

    engine.delete_item(&id).unwrap();
    assert!(engine.get_item(&id).unwrap().is_none());
}

#[test]
fn full_lifecycle_in_memory() {
    init_tracing();
    let (engine, registry) = engine();
    full_lifecycle(engine, registry);
}

#[test]
fn full_lifecycle_on_sqlite() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("revisions.db")).unwrap());
    let (engine, registry) = RevisionEngine::from_config(store, &RevisionConfig::default());
    full_lifecycle(engine, registry);
}

// ── Restore errors ───────────────────────────────────────────────

#[test]
fn restore_of_canonical_item_is_rejected() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    assert!(matches!(engine.restore(&item.id), Err(SyncError::NotASnapshot(_))));
}

#[test]
fn restore_of_missing_snapshot_is_not_found() {
    let (engine, _) = engine();
    assert!(matches!(engine.restore(&ItemId::new()), Err(SyncError::NotFound(_))));
}

#[test]
fn update_of_snapshot_is_rejected() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    let snap = engine.update_item(&item.id, ItemUpdate::body("x")).unwrap().unwrap();
    assert!(matches!(
        engine.update_item(&snap, ItemUpdate::body("y")),
        Err(SyncError::NotCanonical(_))
    ));
}

// ── Autosave and preview ─────────────────────────────────────────

#[test]
fn autosave_mirrors_fields_and_preview_reads_them() {
    let (engine, registry) = engine();
    registry.register(StaticKeys::new(["color"]));
    let item = engine.create_item("Doc", "live body").unwrap();
    engine.update_meta(&item.id, "color", "red", None).unwrap();

    let fields = form::decode_fields([("color", r"it\'s green"), ("notes", "ignored")]);
    let draft = engine
        .autosave(
            &item.id,
            DraftUpdate {
                body: Some("draft body".into()),
                fields,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(draft.body, "draft body");
    assert_eq!(draft.parent, Some(item.id));
    assert!(engine.get_meta(&draft.id, "notes").unwrap().is_empty());

    // Previewing the item redirects tracked reads to the draft.
    let preview = engine.read_meta(Some(&item), &item.id, "color", true).unwrap();
    assert_eq!(preview, MetaRead::Single(Some("it's green".into())));

    // Without a preview the live value is read.
    let live = engine.read_meta(None, &item.id, "color", true).unwrap();
    assert_eq!(live, MetaRead::Single(Some("red".into())));
}

#[test]
fn autosave_reuses_the_existing_draft() {
    let (engine, registry) = engine();
    registry.register(StaticKeys::new(["color"]));
    let item = engine.create_item("Doc", "").unwrap();

    let first = engine
        .autosave(
            &item.id,
            DraftUpdate {
                fields: DraftFields::new().with("color", "red"),
                ..Default::default()
            },
        )
        .unwrap();
    let second = engine
        .autosave(
            &item.id,
            DraftUpdate {
                fields: DraftFields::new().with("color", ""),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(first.id, second.id);
    assert!(engine.get_meta(&second.id, "color").unwrap().is_empty());
}

#[test]
fn autosave_does_not_snapshot() {
    let (engine, _) = engine();
    let item = engine.create_item("Doc", "").unwrap();
    engine.autosave(&item.id, DraftUpdate::default()).unwrap();
    assert!(engine.snapshots(&item.id).unwrap().is_empty());
}

// ── Custom hooks ─────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    snapshots: AtomicUsize,
    restores: AtomicUsize,
}

impl RevisionHooks for Counting {
    fn snapshot_created(&self, _: &ContentItem, _: &ContentItem) -> SyncResult<()> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restored(&self, _: &ContentItem, _: &ContentItem) -> SyncResult<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct AlwaysChanged;

impl RevisionHooks for AlwaysChanged {
    fn has_changed(&self, _: bool, _: &ContentItem, _: &ContentItem) -> SyncResult<bool> {
        Ok(true)
    }
}

struct NeverChanged;

impl RevisionHooks for NeverChanged {
    fn has_changed(&self, _: bool, _: &ContentItem, _: &ContentItem) -> SyncResult<bool> {
        Ok(false)
    }
}

#[test]
fn hooks_observe_lifecycle_events() {
    let mut engine = RevisionEngine::new(Arc::new(MemoryStore::new()));
    let counting = Arc::new(Counting::default());
    engine.add_hooks(counting.clone());

    let item = engine.create_item("Doc", "").unwrap();
    let s1 = engine.update_item(&item.id, ItemUpdate::body("a")).unwrap().unwrap();
    engine.update_item(&item.id, ItemUpdate::body("b")).unwrap();
    engine.restore(&s1).unwrap();

    assert_eq!(counting.restores.load(Ordering::SeqCst), 1);
    // two updates plus the snapshot taken after restore
    assert_eq!(counting.snapshots.load(Ordering::SeqCst), 3);
}

#[test]
fn hook_can_force_a_snapshot() {
    let mut engine = RevisionEngine::new(Arc::new(MemoryStore::new()));
    engine.add_hooks(Arc::new(AlwaysChanged));
    let item = engine.create_item("Doc", "").unwrap();
    engine.update_item(&item.id, ItemUpdate::body("a")).unwrap();
    assert!(engine.update_item(&item.id, ItemUpdate::default()).unwrap().is_some());
}

#[test]
fn hook_cannot_suppress_a_content_change() {
    let mut engine = RevisionEngine::new(Arc::new(MemoryStore::new()));
    engine.add_hooks(Arc::new(NeverChanged));
    let item = engine.create_item("Doc", "").unwrap();
    engine.update_item(&item.id, ItemUpdate::body("a")).unwrap();
    assert!(engine.update_item(&item.id, ItemUpdate::body("b")).unwrap().is_some());
}
