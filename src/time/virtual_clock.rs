//! Tick-advanced virtual time.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::time::{Clock, MonotonicTime, SyncStatus};

/// Shared state of a virtual clock and its views.
struct ClockInner {
    period: Duration,
    ticks: AtomicU64,
}

impl ClockInner {
    fn elapsed(&self) -> Duration {
        let ticks = self.ticks.load(Ordering::Acquire);
        let nanos = self.period.as_nanos() * ticks as u128;

        Duration::new((nanos / 1_000_000_000) as u64, (nanos % 1_000_000_000) as u32)
    }
}

/// A monotonic, tick-advanced time source.
///
/// The clock only moves when [`advance`](VirtualClock::advance) is called,
/// each call moving time forward by exactly one period. Time is read
/// through the [`steady`](VirtualClock::steady) and
/// [`system`](VirtualClock::system) views.
///
/// Clones share the same time state, so a test fixture can hand a clone to
/// a [`Scheduler`](crate::region::scheduler::Scheduler) and keep one for
/// advancing time. A fresh `VirtualClock` is constructed per fixture;
/// there is deliberately no process-wide instance.
#[derive(Clone)]
pub struct VirtualClock {
    inner: Arc<ClockInner>,
}

impl VirtualClock {
    /// Creates a virtual clock with the specified period, starting at the
    /// epoch.
    ///
    /// The period must not be zero.
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "a virtual clock period cannot be zero");

        Self {
            inner: Arc::new(ClockInner {
                period,
                ticks: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the period of the clock.
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Advances the clock by exactly one period.
    pub fn advance(&self) {
        self.inner.ticks.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the steady view of the clock.
    pub fn steady(&self) -> VirtualSteady {
        VirtualSteady {
            clock: self.clone(),
        }
    }

    /// Returns the system view of the clock.
    pub fn system(&self) -> VirtualSystem {
        VirtualSystem {
            clock: self.clone(),
        }
    }
}

impl Clock for VirtualClock {
    /// Busy-waits, yielding to the OS, until the virtual time reaches the
    /// deadline.
    ///
    /// Time never moves on its own, so some other thread must be advancing
    /// the clock for this to return.
    fn synchronize(&mut self, deadline: MonotonicTime) -> SyncStatus {
        loop {
            let now = self.steady().now();
            if now >= deadline {
                return if now == deadline {
                    SyncStatus::Synchronized
                } else {
                    SyncStatus::OutOfSync(now.duration_since(deadline))
                };
            }

            thread::yield_now();
        }
    }
}

impl fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VirtualClock")
            .field("period", &self.inner.period)
            .field("ticks", &self.inner.ticks.load(Ordering::Relaxed))
            .finish()
    }
}

/// The steady view of a [`VirtualClock`].
///
/// Steady time starts at [`MonotonicTime::EPOCH`] and is suitable for
/// measuring durations.
#[derive(Clone, Debug)]
pub struct VirtualSteady {
    clock: VirtualClock,
}

impl VirtualSteady {
    /// Returns the current virtual time.
    pub fn now(&self) -> MonotonicTime {
        MonotonicTime::EPOCH + self.clock.inner.elapsed()
    }
}

/// The system view of a [`VirtualClock`].
///
/// System time-points interconvert with an integer second representation,
/// mirroring the wall-clock `time_t` conventions.
#[derive(Clone, Debug)]
pub struct VirtualSystem {
    clock: VirtualClock,
}

impl VirtualSystem {
    /// Returns the current virtual time.
    pub fn now(&self) -> MonotonicTime {
        MonotonicTime::EPOCH + self.clock.inner.elapsed()
    }

    /// Converts a time-point into whole seconds since the epoch,
    /// truncating any sub-second part.
    pub fn to_time_t(t: MonotonicTime) -> i64 {
        t.as_secs()
    }

    /// Converts whole seconds since the epoch into a time-point.
    pub fn from_time_t(secs: i64) -> MonotonicTime {
        // Infallible: a zero sub-second part is always valid.
        MonotonicTime::new(secs, 0).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_advance_moves_time_by_one_period() {
        let clock = VirtualClock::new(Duration::from_millis(10));
        let steady = clock.steady();

        let one_tick_ago = steady.now();
        clock.advance();
        let now = steady.now();

        assert_eq!(now.duration_since(one_tick_ago), Duration::from_millis(10));
        assert_ne!(one_tick_ago, now);
    }

    #[test]
    fn advance_accumulates_exactly() {
        let clock = VirtualClock::new(Duration::from_millis(10));
        let steady = clock.steady();

        let start = steady.now();
        for _ in 0..1000 {
            clock.advance();
        }

        assert_eq!(steady.now().duration_since(start), Duration::from_secs(10));
    }

    #[test]
    fn time_t_conversion_truncates_to_seconds() {
        let clock = VirtualClock::new(Duration::from_millis(1500));
        let system = clock.system();

        for _ in 0..3 {
            clock.advance();
        }

        // 4.5s of virtual time.
        let now = system.now();
        let c_time = VirtualSystem::to_time_t(now);
        let back_converted = VirtualSystem::from_time_t(c_time);

        assert_eq!(c_time, 4);
        assert_eq!(back_converted, MonotonicTime::new(4, 0).unwrap());
        assert_eq!(back_converted.as_secs(), now.as_secs());
    }

    #[test]
    fn views_share_the_time_state() {
        let clock = VirtualClock::new(Duration::from_secs(1));
        let steady = clock.steady();
        let system = clock.system();

        clock.advance();

        assert_eq!(steady.now().as_secs(), 1);
        assert_eq!(system.now().as_secs(), 1);
    }
}
