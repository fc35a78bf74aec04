//! Time sources for pacing regions.
//!
//! Region deadlines are expressed as [`MonotonicTime`] timestamps, a
//! nanosecond-resolution TAI time-point re-exported from the [`tai_time`]
//! crate. The [`Clock`] trait abstracts over how a region thread waits for
//! its next deadline: [`SystemClock`] and [`AutoSystemClock`] pace regions
//! against the system's monotonic clock, [`NoClock`] does not pace at all,
//! and [`VirtualClock`] paces against a tick-advanced virtual time source
//! for fully deterministic tests.

mod clock;
mod virtual_clock;

pub use clock::{AutoSystemClock, Clock, NoClock, SyncStatus, SystemClock};
pub use virtual_clock::{VirtualClock, VirtualSteady, VirtualSystem};

pub use tai_time::MonotonicTime;
