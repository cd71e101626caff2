use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;

#[test]
fn get_set_basic() {
    let obs = Observable::new(42);
    assert_eq!(obs.get(), 42);
    assert_eq!(obs.version(), 0);

    obs.set(99);
    assert_eq!(obs.get(), 99);
    assert_eq!(obs.version(), 1);
}

#[test]
fn equal_value_is_not_a_change() {
    let obs = Observable::new("a".to_string());
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let _sub = obs.subscribe(move |_| counter.set(counter.get() + 1));

    obs.set("a".to_string());
    assert_eq!(obs.version(), 0);
    assert_eq!(hits.get(), 0);

    obs.set("b".to_string());
    assert_eq!(hits.get(), 1);
}

#[test]
fn update_mutates_in_place() {
    let obs = Observable::new(vec![1, 2, 3]);
    obs.update(|v| v.push(4));
    assert_eq!(obs.get(), vec![1, 2, 3, 4]);
    assert_eq!(obs.version(), 1);

    obs.update(|_| {});
    assert_eq!(obs.version(), 1);
}

#[test]
fn subscribers_run_in_registration_order() {
    let obs = Observable::new(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    let _a = obs.subscribe(move |v| first.borrow_mut().push(format!("a{v}")));
    let second = Rc::clone(&log);
    let _b = obs.subscribe(move |v| second.borrow_mut().push(format!("b{v}")));

    obs.set(1);
    assert_eq!(*log.borrow(), vec!["a1", "b1"]);
}

#[test]
fn dropping_subscription_detaches() {
    let obs = Observable::new(0);
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let sub = obs.subscribe(move |_| counter.set(counter.get() + 1));

    obs.set(1);
    drop(sub);
    obs.set(2);

    assert_eq!(hits.get(), 1);
    assert_eq!(obs.live_subscriber_count(), 0);
    assert_eq!(obs.subscriber_count(), 0, "dead entry pruned on notify");
}

#[test]
fn disposing_bag_tears_down_everything() {
    let a = Observable::new(0);
    let b = Observable::new(0);
    let hits = Rc::new(Cell::new(0));

    let mut bag = Subscriptions::new();
    for obs in [&a, &b] {
        let counter = Rc::clone(&hits);
        bag.hold(obs.subscribe(move |_| counter.set(counter.get() + 1)));
    }
    assert_eq!(bag.len(), 2);

    a.set(1);
    bag.dispose();
    a.set(2);
    b.set(2);

    assert_eq!(hits.get(), 1);
    assert!(bag.is_empty());
}

#[test]
fn reentrant_set_from_callback() {
    let source = Observable::new(0);
    let mirror = Observable::new(0);
    let target = mirror.clone();
    let _sub = source.subscribe(move |v| target.set(*v * 10));

    source.set(4);
    assert_eq!(mirror.get(), 40);
}

#[test]
fn derive_tracks_source() {
    let source = Observable::new(String::new());
    let (derived, _sub) = derive(&source, |s: &String| s.len());
    assert_eq!(derived.get(), 0);

    source.set("abc".to_string());
    assert_eq!(derived.get(), 3);

    // Same length: derived stays distinct-until-changed.
    source.set("xyz".to_string());
    assert_eq!(derived.version(), 1);
}

#[test]
fn combine_into_recomputes_from_all_sources() {
    let a = Observable::new(1);
    let b = Observable::new(2);
    let sum = Observable::new(0);

    let (ra, rb) = (a.clone(), b.clone());
    let _subs = combine_into(&[a.clone(), b.clone()], &sum, move || ra.get() + rb.get());
    assert_eq!(sum.get(), 3);

    a.set(10);
    assert_eq!(sum.get(), 12);
    b.set(5);
    assert_eq!(sum.get(), 15);
}
