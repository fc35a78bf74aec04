//! End-to-end assembly of composite nodes into a ticked graph.

use std::sync::{Arc, Mutex};

use tickflow::connect::{connect, lift};
use tickflow::nodes::{on_changed, transform, EventSwitch};
use tickflow::ports::{EventSource, StateSource};
use tickflow::region::{Region, TickRate};

#[test]
fn chained_callables_evaluate_like_a_single_function() {
    let give_one = || 1;
    let inc = |x: i32| x + 1;

    assert_eq!(connect(connect(give_one, inc), inc).run(), 3);
    assert_eq!((lift(give_one) >> lift(inc) >> lift(inc)).run(), 3);
}

#[test]
fn event_switch_drops_events_from_unselected_inputs() {
    let switch: EventSwitch<i32, &str> = EventSwitch::new();
    switch
        .control()
        .connect_source(&StateSource::constant("A"))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    switch.out().connect(move |v: i32| s.lock().unwrap().push(v));

    let feed_a = EventSource::new();
    feed_a.connect_sink(&switch.in_port("A"));
    let feed_b = EventSource::new();
    feed_b.connect_sink(&switch.in_port("B"));

    feed_b.fire(42);
    assert!(seen.lock().unwrap().is_empty());

    feed_a.fire(7);
    assert_eq!(*seen.lock().unwrap(), vec![7]);
}

// A watch node driven by a region's work tick: the observed state goes
// through [5, 5, 5, 6, 6, 7] over six cycles and the watch must fire on
// the two changes only.
#[test]
fn on_changed_fires_on_changes_only() {
    let region = Region::new("watcher", TickRate::Fast);

    let node = on_changed::<i32>().named("level_watch");

    let values = Mutex::new(vec![5, 5, 5, 6, 6, 7].into_iter());
    node.input()
        .bind(move || values.lock().unwrap().next().unwrap())
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    node.out().connect(move |v: i32| s.lock().unwrap().push(v));

    region.ticks().work_tick().connect(node.check_tick());

    for _ in 0..6 {
        region.ticks().fire_cycle();
    }

    assert_eq!(*seen.lock().unwrap(), vec![6, 7]);
}

// A transform node spliced into an event connection, with its parameter
// pulled from a state source at every delivery.
#[test]
fn transform_parameter_is_pulled_per_event() {
    let offset = Arc::new(Mutex::new(10));
    let node = transform(|x: i32, p: i32| x + p);
    let o = offset.clone();
    node.param().bind(move || *o.lock().unwrap()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let source = EventSource::new();
    let node = Arc::new(node);
    let s = seen.clone();
    source.connect(move |v: i32| {
        if let Ok(out) = node.call(v) {
            s.lock().unwrap().push(out);
        }
    });

    source.fire(1);
    *offset.lock().unwrap() = 20;
    source.fire(1);

    assert_eq!(*seen.lock().unwrap(), vec![11, 21]);
}
