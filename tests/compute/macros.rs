//! Integration tests for the macro composer
//!
//! Tests each rule factory evaluated against live entities.

use spindle_compute::macros::{
    alias, and, compare, constant, equal, map_by, not, or, sort, sorted, union,
};
use spindle_compute::{dep, Reactor, TypeDef};
use spindle_foundation::{EntityId, Value};

fn strings(items: &[&str]) -> Value {
    items.iter().map(|s| Value::from(*s)).collect::<Vec<_>>().into()
}

/// Spawns member entities carrying one attribute and returns them as a
/// sequence value.
fn members(reactor: &mut Reactor, key: &str, values: &[&str]) -> (Value, Vec<EntityId>) {
    let mut ids = Vec::new();
    let mut seq = Vec::new();
    for v in values {
        let e = reactor.spawn_plain([(key, Value::from(*v))]);
        ids.push(e);
        seq.push(Value::EntityRef(e));
    }
    (seq.into(), ids)
}

// =============================================================================
// Boolean macros
// =============================================================================

#[test]
fn not_equal_composition() {
    let mut reactor = Reactor::new();
    let ty = reactor
        .register_type(
            TypeDef::new("person")
                .computed("napTime", not(equal("state", "sleepy")))
                .unwrap(),
        )
        .unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    assert_eq!(reactor.get(e, "napTime").unwrap(), Value::Bool(false));
    reactor.set(e, "state", Value::from("awake")).unwrap();
    assert_eq!(reactor.get(e, "napTime").unwrap(), Value::Bool(true));
}

#[test]
fn and_over_mixed_arguments() {
    let mut reactor = Reactor::new();
    let ty = reactor
        .register_type(
            TypeDef::new("person")
                .computed(
                    "ready",
                    and(vec![dep(equal("state", "rested")), dep(not("hungry"))]),
                )
                .unwrap(),
        )
        .unwrap();
    let e = reactor
        .spawn(
            ty,
            [
                ("state", Value::from("rested")),
                ("hungry", Value::Bool(false)),
            ],
        )
        .unwrap();

    assert_eq!(reactor.get(e, "ready").unwrap(), Value::Bool(true));
    reactor.set(e, "hungry", Value::Bool(true)).unwrap();
    assert_eq!(reactor.get(e, "ready").unwrap(), Value::Bool(false));
}

#[test]
fn or_folds_truthiness_to_bool() {
    let mut reactor = Reactor::new();
    let ty = reactor
        .register_type(
            TypeDef::new("person")
                .computed("either", or(vec![dep("a"), dep("b")]))
                .unwrap(),
        )
        .unwrap();

    // "a" is a truthy non-bool; the result is still a Bool.
    let e = reactor.spawn(ty, [("a", Value::Int(7))]).unwrap();
    assert_eq!(reactor.get(e, "either").unwrap(), Value::Bool(true));

    let f = reactor.spawn(ty, [] as [(&str, Value); 0]).unwrap();
    assert_eq!(reactor.get(f, "either").unwrap(), Value::Bool(false));
}

#[test]
fn missing_dependencies_flow_as_nil() {
    let mut reactor = Reactor::new();
    let ty = reactor
        .register_type(
            TypeDef::new("person")
                .computed("napTime", not("sleepy"))
                .unwrap(),
        )
        .unwrap();
    let e = reactor.spawn(ty, [] as [(&str, Value); 0]).unwrap();

    // not(Nil) is true; no error for the absent attribute.
    assert_eq!(reactor.get(e, "napTime").unwrap(), Value::Bool(true));
}

// =============================================================================
// alias and constant
// =============================================================================

#[test]
fn alias_tracks_a_dotted_path() {
    let mut reactor = Reactor::new();
    let inner = reactor.spawn_plain([("p", Value::from("original"))]);
    let outer = reactor.spawn_plain([("indirection", Value::EntityRef(inner))]);
    reactor
        .define_computed(outer, "q", alias("indirection.p"))
        .unwrap();

    assert_eq!(reactor.get(outer, "q").unwrap(), Value::from("original"));

    reactor.set(inner, "p", Value::from("updated")).unwrap();
    assert_eq!(reactor.get(outer, "q").unwrap(), Value::from("updated"));
}

#[test]
fn constant_is_inert() {
    let mut reactor = Reactor::new();
    let ty = reactor
        .register_type(
            TypeDef::new("thing")
                .computed("answer", constant(42))
                .unwrap(),
        )
        .unwrap();
    let e = reactor.spawn(ty, [] as [(&str, Value); 0]).unwrap();

    assert_eq!(reactor.get(e, "answer").unwrap(), Value::Int(42));
    reactor.set(e, "anything", Value::Int(1)).unwrap();
    assert_eq!(reactor.get(e, "answer").unwrap(), Value::Int(42));
}

// =============================================================================
// Collection macros
// =============================================================================

#[test]
fn map_by_projects_member_attributes() {
    let mut reactor = Reactor::new();
    let (people, _) = members(&mut reactor, "firstName", &["Alex", "David"]);
    let e = reactor.spawn_plain([("people", people)]);
    reactor
        .define_computed(e, "names", map_by("people", "firstName"))
        .unwrap();

    assert_eq!(
        reactor.get(e, "names").unwrap(),
        strings(&["Alex", "David"])
    );
}

#[test]
fn map_by_sees_member_mutations() {
    let mut reactor = Reactor::new();
    let (people, ids) = members(&mut reactor, "firstName", &["Alex", "David"]);
    let e = reactor.spawn_plain([("people", people)]);
    reactor
        .define_computed(e, "names", map_by("people", "firstName"))
        .unwrap();
    reactor.get(e, "names").unwrap();

    reactor.set(ids[0], "firstName", Value::from("Sasha")).unwrap();
    assert_eq!(
        reactor.get(e, "names").unwrap(),
        strings(&["Sasha", "David"])
    );
}

#[test]
fn map_by_of_non_sequence_is_empty() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("people", Value::Int(3))]);
    reactor
        .define_computed(e, "names", map_by("people", "firstName"))
        .unwrap();

    assert_eq!(reactor.get(e, "names").unwrap(), strings(&[]));
}

#[test]
fn union_concatenates_and_dedups() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([
        ("xs", strings(&["a", "b"])),
        ("ys", strings(&["b", "c"])),
    ]);
    reactor
        .define_computed(e, "all", union(vec![dep("xs"), dep("ys")]))
        .unwrap();

    assert_eq!(reactor.get(e, "all").unwrap(), strings(&["a", "b", "c"]));
}

#[test]
fn union_tolerates_nil_and_scalars() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("xs", strings(&["a"])), ("y", Value::from("b"))]);
    reactor
        .define_computed(e, "all", union(vec![dep("missing"), dep("xs"), dep("y")]))
        .unwrap();

    assert_eq!(reactor.get(e, "all").unwrap(), strings(&["a", "b"]));
}

#[test]
fn sorted_orders_with_default_comparator() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("xs", strings(&["David", "Alex", "Cyril"]))]);
    reactor.define_computed(e, "ordered", sorted("xs")).unwrap();

    assert_eq!(
        reactor.get(e, "ordered").unwrap(),
        strings(&["Alex", "Cyril", "David"])
    );
}

#[test]
fn sort_with_custom_comparator() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("xs", strings(&["aa", "b", "ccc"]))]);
    // Sort by string length, descending.
    reactor
        .define_computed(
            e,
            "by_len",
            sort("xs", |a, b| {
                let la = a.as_str().map_or(0, str::len);
                let lb = b.as_str().map_or(0, str::len);
                Ok(lb.cmp(&la))
            }),
        )
        .unwrap();

    assert_eq!(
        reactor.get(e, "by_len").unwrap(),
        strings(&["ccc", "aa", "b"])
    );
}

#[test]
fn failing_comparator_surfaces_on_read_and_retries() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("xs", Value::from(vec![2i64, 1]))]);
    reactor
        .define_computed(
            e,
            "ordered",
            sort("xs", |a, b| match (a.as_int(), b.as_int()) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => Err(spindle_foundation::Error::rule_failed(
                    "sort",
                    "expected integers",
                )),
            }),
        )
        .unwrap();

    assert_eq!(
        reactor.get(e, "ordered").unwrap(),
        Value::from(vec![1i64, 2])
    );

    // Poison the input; the read errors but the system stays usable.
    reactor.set(e, "xs", strings(&["not", "ints"])).unwrap();
    assert!(reactor.get(e, "ordered").is_err());

    reactor.set(e, "xs", Value::from(vec![3i64, 2])).unwrap();
    assert_eq!(
        reactor.get(e, "ordered").unwrap(),
        Value::from(vec![2i64, 3])
    );
}

#[test]
fn default_compare_is_total() {
    use std::cmp::Ordering;
    // Nil first, numbers before strings, same-type natural order.
    assert_eq!(compare(&Value::Nil, &Value::Int(1)), Ordering::Less);
    assert_eq!(compare(&Value::Int(2), &Value::from("a")), Ordering::Less);
    assert_eq!(compare(&Value::Int(1), &Value::Float(1.5)), Ordering::Less);
    assert_eq!(compare(&Value::from("b"), &Value::from("a")), Ordering::Greater);
}
