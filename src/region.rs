//! Parallel regions and their tick cycle.
//!
//! Nodes are partitioned into regions, each of which is driven on its own
//! OS thread by a periodic cycle of two ticks:
//!
//! 1. `switch_tick`, which commands the cross-region buffers fed by this
//!    region to publish their queued events, and
//! 2. `work_tick`, which drives the computation of the region.
//!
//! Within one cycle, all `switch_tick` handlers complete before any
//! `work_tick` handler runs. Everything connected inside a single region
//! executes synchronously on the region thread; only connections crossing
//! a region boundary are buffered (see [`channel`](crate::channel)).
//!
//! Regions are created through a [`Scheduler`](scheduler::Scheduler), or
//! with [`Region::new`] when ticks are driven manually, e.g. in tests.

pub mod scheduler;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::EventSource;

/// Identity of a region, unique within the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RegionId(usize);

impl RegionId {
    fn next() -> Self {
        static NEXT_REGION_ID: AtomicUsize = AtomicUsize::new(0);

        Self(NEXT_REGION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The named cycle periods a region can be created with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TickRate {
    /// 10 ms cycle period.
    Fast,
    /// 100 ms cycle period.
    Medium,
    /// 1 s cycle period.
    Slow,
}

impl TickRate {
    /// Returns the cycle period of this rate.
    pub const fn period(self) -> Duration {
        match self {
            Self::Fast => Duration::from_millis(10),
            Self::Medium => Duration::from_millis(100),
            Self::Slow => Duration::from_secs(1),
        }
    }
}

/// The two tick event sources driving a region.
pub struct TickController {
    switch: EventSource<()>,
    work: EventSource<()>,
}

impl TickController {
    fn new() -> Self {
        Self {
            switch: EventSource::new(),
            work: EventSource::new(),
        }
    }

    /// Returns the source firing on the switch tick of the region.
    ///
    /// Cross-region buffers fed by this region subscribe here; there is
    /// rarely a reason for nodes to.
    pub fn switch_tick(&self) -> EventSource<()> {
        self.switch.clone()
    }

    /// Returns the source firing on the work tick of the region.
    ///
    /// Connect nodes that want to be triggered every cycle to this.
    pub fn work_tick(&self) -> EventSource<()> {
        self.work.clone()
    }

    /// Fires one full cycle: the switch tick, then the work tick.
    pub fn fire_cycle(&self) {
        self.switch.fire(());
        self.work.fire(());
    }
}

impl fmt::Debug for TickController {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TickController").finish_non_exhaustive()
    }
}

/// A scheduling domain with its own thread and tick cycle.
///
/// Regions are shared: every port that belongs to a region holds a weak
/// reference to it. The scheduler and the application hold the owning
/// references.
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    name: String,
    rate: TickRate,
    ticks: TickController,
}

impl Region {
    /// Creates a free-standing region.
    ///
    /// The region is not driven by any thread; its ticks fire only when
    /// [`TickController::fire_cycle`] (or the individual tick sources) are
    /// invoked. Use [`Scheduler::add_region`](scheduler::Scheduler::add_region)
    /// for a region driven periodically.
    pub fn new(name: impl Into<String>, rate: TickRate) -> Arc<Self> {
        Arc::new(Self {
            id: RegionId::next(),
            name: name.into(),
            rate,
            ticks: TickController::new(),
        })
    }

    /// Returns the unique identity of the region.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the name of the region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cycle rate of the region.
    pub fn rate(&self) -> TickRate {
        self.rate
    }

    /// Returns the tick controller of the region.
    pub fn ticks(&self) -> &TickController {
        &self.ticks
    }
}
