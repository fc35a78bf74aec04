use std::fmt;
use std::time::{Duration, Instant};

use tai_time::MonotonicClock;

use crate::time::MonotonicTime;

/// A type that can be used to pace a region thread.
///
/// This trait abstracts over different types of clocks, such as
/// as-fast-as-possible, real-time and virtual clocks. A clock source can be
/// associated to a [`Scheduler`](crate::region::scheduler::Scheduler) prior
/// to starting it.
pub trait Clock: Send {
    /// Blocks until the deadline.
    fn synchronize(&mut self, deadline: MonotonicTime) -> SyncStatus;
}

/// The current synchronization status of a clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    /// The clock is synchronized.
    Synchronized,
    /// The deadline has already elapsed and lags behind the current clock
    /// time by the duration given in the payload.
    OutOfSync(Duration),
}

/// A dummy [`Clock`] that ignores synchronization.
///
/// Choosing this clock effectively makes regions cycle as fast as
/// possible.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoClock {}

impl NoClock {
    /// Constructs a new `NoClock` object.
    pub fn new() -> Self {
        Self {}
    }
}

impl Clock for NoClock {
    /// Returns immediately with status `SyncStatus::Synchronized`.
    fn synchronize(&mut self, _: MonotonicTime) -> SyncStatus {
        SyncStatus::Synchronized
    }
}

/// A real-time [`Clock`] based on the system's monotonic clock.
///
/// This clock accepts an arbitrary reference time and remains synchronized
/// with the system's monotonic clock.
#[derive(Copy, Clone)]
pub struct SystemClock(MonotonicClock);

impl SystemClock {
    /// Constructs a `SystemClock` with an offset between region time and
    /// wall clock specified by a region timestamp matched to an [`Instant`]
    /// timestamp.
    ///
    /// The provided reference time may lie in the past or in the future.
    pub fn from_instant(region_ref: MonotonicTime, wall_clock_ref: Instant) -> Self {
        Self(MonotonicClock::init_from_instant(
            region_ref,
            wall_clock_ref,
        ))
    }
}

impl Clock for SystemClock {
    /// Blocks until the system time corresponds to the specified deadline.
    fn synchronize(&mut self, deadline: MonotonicTime) -> SyncStatus {
        let now = self.0.now();
        if now <= deadline {
            spin_sleep::sleep(deadline.duration_since(now));

            return SyncStatus::Synchronized;
        }

        SyncStatus::OutOfSync(now.duration_since(deadline))
    }
}

impl fmt::Debug for SystemClock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SystemClock").finish_non_exhaustive()
    }
}

/// An automatically initialized real-time [`Clock`] based on the system's
/// monotonic clock.
///
/// This clock is similar to [`SystemClock`] except that the first call to
/// [`synchronize()`](Clock::synchronize) never blocks and implicitly
/// defines the reference time. In other words, the clock starts running on
/// its first invocation, which makes it the natural default for region
/// threads.
#[derive(Copy, Clone, Debug, Default)]
pub struct AutoSystemClock {
    inner: Option<SystemClock>,
}

impl AutoSystemClock {
    /// Constructs a new `AutoSystemClock`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for AutoSystemClock {
    /// Initializes the time reference and returns immediately on the first
    /// call, otherwise blocks until the system time corresponds to the
    /// specified deadline.
    fn synchronize(&mut self, deadline: MonotonicTime) -> SyncStatus {
        match &mut self.inner {
            None => {
                let now = Instant::now();
                self.inner = Some(SystemClock::from_instant(deadline, now));

                SyncStatus::Synchronized
            }
            Some(clock) => clock.synchronize(deadline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_system_clock() {
        let t0 = MonotonicTime::EPOCH;
        const TOLERANCE: f64 = 0.0005; // [s]

        let now = Instant::now();
        let mut clock = SystemClock::from_instant(t0, now);
        let t1 = t0 + Duration::from_millis(200);
        clock.synchronize(t1);
        let elapsed = now.elapsed().as_secs_f64();
        let dt = t1.duration_since(t0).as_secs_f64();

        assert!(
            (dt - elapsed) <= TOLERANCE,
            "Expected t = {:.6}s +/- {:.6}s, measured t = {:.6}s",
            dt,
            TOLERANCE,
            elapsed,
        );
    }

    #[test]
    fn out_of_sync_reports_the_lag() {
        let t0 = MonotonicTime::EPOCH;
        let mut clock = SystemClock::from_instant(t0, Instant::now() + Duration::from_secs(1));

        // A deadline more than 1s in the "past" of the reference.
        match clock.synchronize(t0 - Duration::from_secs(2)) {
            SyncStatus::OutOfSync(lag) => assert!(lag >= Duration::from_secs(1)),
            SyncStatus::Synchronized => panic!("expected an out-of-sync status"),
        }
    }
}
