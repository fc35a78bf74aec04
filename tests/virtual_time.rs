//! Regions paced by virtual time.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tickflow::region::scheduler::Scheduler;
use tickflow::region::TickRate;
use tickflow::time::{VirtualClock, VirtualSystem};

#[test]
fn advancing_accumulates_whole_periods() {
    let clock = VirtualClock::new(Duration::from_millis(10));
    let steady = clock.steady();

    let start = steady.now();
    for _ in 0..1000 {
        clock.advance();
    }

    assert_eq!(steady.now().duration_since(start), Duration::from_secs(10));
}

#[test]
fn system_view_round_trips_whole_seconds() {
    let clock = VirtualClock::new(Duration::from_secs(1));
    for _ in 0..1234 {
        clock.advance();
    }

    let now = clock.system().now();
    let back = VirtualSystem::from_time_t(VirtualSystem::to_time_t(now));

    assert_eq!(back, now);
}

// A region driven by virtual time can never run more cycles than the
// advanced virtual time allows.
#[test]
fn regions_cannot_outpace_virtual_time() {
    let clock = VirtualClock::new(Duration::from_millis(10));

    let mut scheduler = Scheduler::with_clock({
        let clock = clock.clone();
        move || clock.clone()
    });
    let region = scheduler.add_region("virtual", TickRate::Fast);

    let cycles = Arc::new(Mutex::new(0u64));
    let c = cycles.clone();
    region.ticks().work_tick().connect(move || *c.lock().unwrap() += 1);

    let running = scheduler.start();

    let mut advances = 0u64;
    while *cycles.lock().unwrap() < 5 {
        clock.advance();
        advances += 1;
        thread::yield_now();
        assert!(advances < 1_000_000, "region thread is not making progress");
    }

    // The region thread may be waiting on its next deadline; keep virtual
    // time moving until the shutdown goes through.
    let stopper = thread::spawn(move || running.stop());
    while !stopper.is_finished() {
        clock.advance();
        advances += 1;
        thread::yield_now();
    }
    stopper.join().unwrap();

    let cycles = *cycles.lock().unwrap();
    assert!(cycles >= 5);
    assert!(cycles <= advances + 1);
}
