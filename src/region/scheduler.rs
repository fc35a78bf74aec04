//! Periodic, per-region tick scheduling.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::time::{AutoSystemClock, Clock, MonotonicTime, SyncStatus};

use super::{Region, TickRate};

/// Builder for a set of periodically driven regions.
///
/// Each region added to the scheduler is driven on its own OS thread once
/// [`start`](Scheduler::start) is called. The thread loop is
///
/// 1. block until the next cycle deadline,
/// 2. fire the switch tick,
/// 3. fire the work tick.
///
/// Deadlines are measured against the clock produced by the configured
/// clock source, the system's monotonic clock by default. A
/// [`VirtualClock`](crate::time::VirtualClock) source makes the regions run
/// on virtual time.
pub struct Scheduler {
    regions: Vec<Arc<Region>>,
    clock_source: Box<dyn Fn() -> Box<dyn Clock> + Send>,
}

impl Scheduler {
    /// Creates a scheduler pacing its regions with the system's monotonic
    /// clock.
    ///
    /// The time reference is set when the first cycle of each region fires,
    /// so the first cycle runs immediately after [`start`](Self::start).
    pub fn new() -> Self {
        Self::with_clock(AutoSystemClock::new)
    }

    /// Creates a scheduler pacing its regions with clocks produced by the
    /// specified source.
    ///
    /// The source is invoked once per region when the scheduler starts, as
    /// every region thread synchronizes on its own clock instance.
    pub fn with_clock<C, F>(clock_source: F) -> Self
    where
        C: Clock + 'static,
        F: Fn() -> C + Send + 'static,
    {
        Self {
            regions: Vec::new(),
            clock_source: Box::new(move || Box::new(clock_source())),
        }
    }

    /// Creates a region driven at the specified rate and returns it.
    pub fn add_region(&mut self, name: impl Into<String>, rate: TickRate) -> Arc<Region> {
        let region = Region::new(name, rate);
        self.regions.push(region.clone());

        region
    }

    /// Returns the regions added so far.
    pub fn regions(&self) -> &[Arc<Region>] {
        &self.regions
    }

    /// Spawns one thread per region and starts firing tick cycles.
    pub fn start(self) -> RunningScheduler {
        let shutdown = Arc::new(AtomicBool::new(false));

        let handles = self
            .regions
            .into_iter()
            .map(|region| {
                let clock = (self.clock_source)();
                let shutdown = shutdown.clone();
                thread::Builder::new()
                    .name(format!("tickflow-region-{}", region.name()))
                    .spawn(move || run_region(region, clock, shutdown))
                    .expect("failed to spawn region thread")
            })
            .collect();

        RunningScheduler { shutdown, handles }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Scheduler ({} regions)", self.regions.len())
    }
}

/// Handle to a started set of region threads.
///
/// Dropping the handle without calling [`stop`](RunningScheduler::stop)
/// detaches the region threads.
#[derive(Debug)]
pub struct RunningScheduler {
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl RunningScheduler {
    /// Requests a cooperative shutdown and joins all region threads.
    ///
    /// The shutdown flag is checked at the top of each region loop, so
    /// in-flight tick handlers always run to completion. At most one more
    /// cycle per region may fire after this method is called.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::Release);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn run_region(region: Arc<Region>, mut clock: Box<dyn Clock>, shutdown: Arc<AtomicBool>) {
    let period = region.rate().period();
    let mut deadline = MonotonicTime::EPOCH;

    loop {
        if shutdown.load(Ordering::Acquire) {
            break;
        }

        deadline += period;
        if let SyncStatus::OutOfSync(lag) = clock.synchronize(deadline) {
            warn!(
                region = region.name(),
                lag_secs = lag.as_secs_f64(),
                "tick cycle overrun, next cycle fires immediately"
            );
            // Re-base the deadline on the current clock time so the missed
            // cycles do not fire as a burst.
            deadline += lag;
        }

        region.ticks().fire_cycle();
    }
}
