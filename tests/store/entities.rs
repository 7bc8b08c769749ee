//! Integration tests for entity lifecycle
//!
//! Tests generational allocation and stale reference detection.

use spindle_foundation::{EntityId, ErrorKind};
use spindle_store::EntityStore;

#[test]
fn spawned_entities_are_distinct_and_live() {
    let mut store = EntityStore::new();
    let e1 = store.spawn();
    let e2 = store.spawn();

    assert_ne!(e1, e2);
    assert!(store.exists(e1));
    assert!(store.exists(e2));
    assert_eq!(store.len(), 2);
}

#[test]
fn despawn_invalidates_the_handle() {
    let mut store = EntityStore::new();
    let e = store.spawn();
    store.despawn(e).unwrap();

    assert!(!store.exists(e));
    assert!(matches!(
        store.despawn(e).unwrap_err().kind,
        ErrorKind::StaleEntity(_)
    ));
}

#[test]
fn reused_slot_gets_a_new_generation() {
    let mut store = EntityStore::new();
    let e1 = store.spawn();
    store.despawn(e1).unwrap();

    let e2 = store.spawn();
    assert_eq!(e2.index, e1.index);
    assert!(e2.generation > e1.generation);

    // The old handle stays dead even though the slot is live again.
    assert!(!store.exists(e1));
    assert!(store.exists(e2));
}

#[test]
fn validate_distinguishes_stale_from_never_allocated() {
    let mut store = EntityStore::new();
    let e = store.spawn();
    store.despawn(e).unwrap();

    assert!(matches!(
        store.validate(e).unwrap_err().kind,
        ErrorKind::StaleEntity(_)
    ));
    assert!(matches!(
        store.validate(EntityId::new(123, 1)).unwrap_err().kind,
        ErrorKind::EntityNotFound(_)
    ));
}

#[test]
fn iter_skips_dead_entities() {
    let mut store = EntityStore::new();
    let e1 = store.spawn();
    let e2 = store.spawn();
    let e3 = store.spawn();
    store.despawn(e2).unwrap();

    let live: Vec<_> = store.iter().collect();
    assert_eq!(live, vec![e1, e3]);
}
