use revmeta_model::StaticKeys;
use revmeta_sync::KeyRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn empty_registry_tracks_nothing() {
    let registry = KeyRegistry::new();
    assert!(registry.tracked_keys().is_empty());
    assert!(!registry.is_tracked("color"));
}

#[test]
fn providers_chain_in_registration_order() {
    let registry = KeyRegistry::new();
    registry.register(StaticKeys::new(["color"]));
    registry.register(StaticKeys::new(["size", "weight"]));
    assert_eq!(registry.tracked_keys(), vec!["color", "size", "weight"]);
}

#[test]
fn duplicates_collapse_keeping_first_position() {
    let registry = KeyRegistry::new();
    registry.register(StaticKeys::new(["a", "b"]));
    registry.register(StaticKeys::new(["b", "a", "c"]));
    assert_eq!(registry.tracked_keys(), vec!["a", "b", "c"]);
}

#[test]
fn lower_priority_runs_first() {
    let registry = KeyRegistry::new();
    registry.register_with_priority(20, StaticKeys::new(["late"]));
    registry.register_with_priority(5, StaticKeys::new(["early"]));
    registry.register(StaticKeys::new(["middle"]));
    assert_eq!(registry.tracked_keys(), vec!["early", "middle", "late"]);
}

#[test]
fn later_provider_can_filter_earlier_keys() {
    let registry = KeyRegistry::new();
    registry.register(StaticKeys::new(["keep", "drop"]));
    registry.register_with_priority(99, |keys: Vec<String>| {
        keys.into_iter().filter(|k| k != "drop").collect::<Vec<_>>()
    });
    assert_eq!(registry.tracked_keys(), vec!["keep"]);
}

#[test]
fn unregister_removes_only_that_provider() {
    let registry = KeyRegistry::new();
    let a = registry.register(StaticKeys::new(["a"]));
    registry.register(StaticKeys::new(["b"]));
    assert!(registry.unregister(a));
    assert!(!registry.unregister(a));
    assert_eq!(registry.tracked_keys(), vec!["b"]);
    assert_eq!(registry.provider_count(), 1);
}

#[test]
fn clear_removes_everything() {
    let registry = KeyRegistry::new();
    registry.register(StaticKeys::new(["a"]));
    registry.clear();
    assert!(registry.tracked_keys().is_empty());
}

#[test]
fn keys_are_recomputed_on_every_call() {
    let registry = KeyRegistry::new();
    let enabled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&enabled);
    registry.register(move |mut keys: Vec<String>| {
        if flag.load(Ordering::SeqCst) {
            keys.push("toggled".to_string());
        }
        keys
    });

    assert!(!registry.is_tracked("toggled"));
    enabled.store(true, Ordering::SeqCst);
    assert!(registry.is_tracked("toggled"));
}
