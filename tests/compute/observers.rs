//! Integration tests for observers and batched settlement.

use spindle_compute::macros::{equal, not};
use spindle_compute::{Change, Reactor, TypeDef};
use spindle_foundation::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn nap_type() -> TypeDef {
    TypeDef::new("person")
        .computed("napTime", not(equal("state", "sleepy")))
        .unwrap()
}

#[test]
fn observers_see_settled_computed_values() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    let changes: Rc<RefCell<Vec<Change>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    reactor
        .observe(e, "napTime", move |change| {
            sink.borrow_mut().push(change.clone());
        })
        .unwrap();

    reactor.set(e, "state", Value::from("not sleepy")).unwrap();

    let log = changes.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].entity, e);
    assert_eq!(&*log[0].attribute, "napTime");
    assert_eq!(log[0].value, Value::Bool(true));
}

#[test]
fn observers_on_stored_attributes() {
    let mut reactor = Reactor::new();
    let e = reactor.spawn_plain([("state", Value::from("sleepy"))]);

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    reactor
        .observe(e, "state", move |change| {
            sink.borrow_mut().push(change.value.clone());
        })
        .unwrap();

    reactor.set(e, "state", Value::from("awake")).unwrap();
    reactor.set(e, "state", Value::from("awake")).unwrap();

    assert_eq!(*log.borrow(), vec![Value::from("awake")]);
}

#[test]
fn no_firing_when_computed_value_is_unchanged() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("awake"))])
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    reactor
        .observe(e, "napTime", move |_| *counter.borrow_mut() += 1)
        .unwrap();

    // napTime is true before and after; the dependency changed but the
    // computed value did not.
    reactor.set(e, "state", Value::from("bored")).unwrap();
    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn batch_fires_once_for_many_writes() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    reactor
        .observe(e, "napTime", move |_| *counter.borrow_mut() += 1)
        .unwrap();

    reactor.batch(|r| {
        r.set(e, "state", Value::from("tossing")).unwrap();
        r.set(e, "state", Value::from("turning")).unwrap();
        r.set(e, "state", Value::from("wide awake")).unwrap();
    });

    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn nested_batches_settle_at_the_outermost() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    reactor
        .observe(e, "napTime", move |_| *counter.borrow_mut() += 1)
        .unwrap();

    let probe = fired.clone();
    reactor.batch(|r| {
        r.batch(|r| {
            r.set(e, "state", Value::from("awake")).unwrap();
        });
        // Inner batch end does not settle.
        assert_eq!(*probe.borrow(), 0);
    });

    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn reverting_within_a_batch_fires_nothing() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    reactor
        .observe(e, "napTime", move |_| *counter.borrow_mut() += 1)
        .unwrap();

    reactor.batch(|r| {
        r.set(e, "state", Value::from("awake")).unwrap();
        r.set(e, "state", Value::from("sleepy")).unwrap();
    });

    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn observers_prime_at_registration() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("awake"))])
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    // napTime is already true at registration; observing must not fire
    // for the current value.
    reactor
        .observe(e, "napTime", move |_| *counter.borrow_mut() += 1)
        .unwrap();
    assert_eq!(*fired.borrow(), 0);

    reactor.set(e, "state", Value::from("sleepy")).unwrap();
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn multiple_observers_fire_independently() {
    let mut reactor = Reactor::new();
    let ty = reactor.register_type(nap_type()).unwrap();
    let e = reactor
        .spawn(ty, [("state", Value::from("sleepy"))])
        .unwrap();

    let a = Rc::new(RefCell::new(0));
    let b = Rc::new(RefCell::new(0));
    let ca = a.clone();
    let cb = b.clone();
    reactor
        .observe(e, "napTime", move |_| *ca.borrow_mut() += 1)
        .unwrap();
    let id_b = reactor
        .observe(e, "napTime", move |_| *cb.borrow_mut() += 1)
        .unwrap();

    reactor.set(e, "state", Value::from("awake")).unwrap();
    assert_eq!((*a.borrow(), *b.borrow()), (1, 1));

    reactor.unobserve(id_b);
    reactor.set(e, "state", Value::from("sleepy")).unwrap();
    assert_eq!((*a.borrow(), *b.borrow()), (2, 1));
}

#[test]
fn despawn_drops_observers() {
    let mut reactor = Reactor::new();
    let e1 = reactor.spawn_plain([("x", Value::Int(1))]);
    let e2 = reactor.spawn_plain([("x", Value::Int(1))]);

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    reactor
        .observe(e1, "x", move |_| *counter.borrow_mut() += 1)
        .unwrap();
    let counter2 = fired.clone();
    reactor
        .observe(e2, "x", move |_| *counter2.borrow_mut() += 1)
        .unwrap();

    reactor.despawn(e1).unwrap();
    reactor.set(e2, "x", Value::Int(2)).unwrap();

    // Only the live entity's observer fires.
    assert_eq!(*fired.borrow(), 1);
}
