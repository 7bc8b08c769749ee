//! Integration tests for the attribute world
//!
//! Tests get/set change detection and Nil-tolerant path traversal.

use spindle_foundation::{AttrMap, AttrPath, Value};
use spindle_store::World;

// =============================================================================
// Stored attributes
// =============================================================================

#[test]
fn missing_attribute_reads_as_nil() {
    let mut world = World::new();
    let e = world.spawn();
    assert_eq!(world.get(e, "state").unwrap(), Value::Nil);
}

#[test]
fn set_reports_change_by_value_equality() {
    let mut world = World::new();
    let e = world.spawn();

    assert!(world.set(e, "state", Value::from("sleepy")).unwrap());
    assert!(!world.set(e, "state", Value::from("sleepy")).unwrap());
    assert!(world.set(e, "state", Value::from("awake")).unwrap());
}

#[test]
fn setting_nil_clears_the_attribute() {
    let mut world = World::new();
    let e = world.spawn_with([("state", Value::from("sleepy"))]);

    assert!(world.set(e, "state", Value::Nil).unwrap());
    assert_eq!(world.get(e, "state").unwrap(), Value::Nil);
    // Clearing an already-absent attribute is not a change.
    assert!(!world.set(e, "state", Value::Nil).unwrap());
}

#[test]
fn reads_and_writes_on_dead_entities_error() {
    let mut world = World::new();
    let e = world.spawn();
    world.despawn(e).unwrap();

    assert!(world.get(e, "state").is_err());
    assert!(world.set(e, "state", Value::Int(1)).is_err());
}

#[test]
fn attribute_rows_do_not_leak_across_slot_reuse() {
    let mut world = World::new();
    let e1 = world.spawn_with([("state", Value::from("sleepy"))]);
    world.despawn(e1).unwrap();

    let e2 = world.spawn();
    assert_eq!(e2.index, e1.index);
    assert_eq!(world.get(e2, "state").unwrap(), Value::Nil);
}

// =============================================================================
// Path traversal
// =============================================================================

#[test]
fn path_through_entity_reference() {
    let mut world = World::new();
    let inner = world.spawn_with([("p", Value::Bool(true))]);
    let outer = world.spawn_with([("indirection", Value::EntityRef(inner))]);

    let path = AttrPath::parse("indirection.p");
    assert_eq!(world.get_path(outer, &path).unwrap(), Value::Bool(true));
}

#[test]
fn path_through_nested_map() {
    let mut world = World::new();
    let address = AttrMap::new().insert(Value::from("street"), Value::from("Elm"));
    let home = AttrMap::new().insert(Value::from("address"), Value::Map(address));
    let e = world.spawn_with([("home", Value::Map(home))]);

    let path = AttrPath::parse("home.address.street");
    assert_eq!(world.get_path(e, &path).unwrap(), Value::from("Elm"));
}

#[test]
fn unresolvable_intermediates_are_nil_not_errors() {
    let mut world = World::new();
    let e = world.spawn_with([("scalar", Value::Int(7))]);

    for p in ["missing.p", "scalar.p", "missing.a.b.c"] {
        let path = AttrPath::parse(p);
        assert_eq!(world.get_path(e, &path).unwrap(), Value::Nil);
    }
}

#[test]
fn path_through_despawned_entity_is_nil() {
    let mut world = World::new();
    let inner = world.spawn_with([("p", Value::Bool(true))]);
    let outer = world.spawn_with([("indirection", Value::EntityRef(inner))]);
    world.despawn(inner).unwrap();

    let path = AttrPath::parse("indirection.p");
    assert_eq!(world.get_path(outer, &path).unwrap(), Value::Nil);
}

// =============================================================================
// Interner
// =============================================================================

#[test]
fn attr_ids_are_stable_per_name() {
    let mut world = World::new();
    let a = world.attr_id("state");
    let b = world.attr_id("state");

    assert_eq!(a, b);
    assert_eq!(world.attr_name(a), Some("state"));
    assert_eq!(world.resolve("never-written"), None);
}
