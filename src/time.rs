//! File timestamps and the clock they are read from
//!
//! Inodes never read the wall clock directly. Every inode is handed an
//! `Arc<dyn Clock>` at construction and asks it for "now" when it is created
//! and when access or modification times are touched.

use serde::{Deserialize, Serialize};
use spin::Mutex;

/// A point in time, as seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSpec {
    pub sec: i64,
    pub nsec: u32,
}

impl TimeSpec {
    pub const EPOCH: TimeSpec = TimeSpec { sec: 0, nsec: 0 };

    pub const fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self {
            sec: millis.div_euclid(1000),
            nsec: (millis.rem_euclid(1000) * 1_000_000) as u32,
        }
    }

    pub const fn as_millis(&self) -> i64 {
        self.sec * 1000 + (self.nsec / 1_000_000) as i64
    }

    /// Returns this time moved forward by `nanos` nanoseconds.
    pub fn add_nanos(self, nanos: u64) -> Self {
        let total = self.nsec as u64 + nanos;
        Self {
            sec: self.sec + (total / 1_000_000_000) as i64,
            nsec: (total % 1_000_000_000) as u32,
        }
    }
}

/// Source of the current time for timestamp updates.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeSpec;
}

/// Wall clock of the host.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> TimeSpec {
        use std::time::{SystemTime, UNIX_EPOCH};

        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => TimeSpec::new(d.as_secs() as i64, d.subsec_nanos()),
            // host clock set before 1970
            Err(e) => {
                let d = e.duration();
                match d.subsec_nanos() {
                    0 => TimeSpec::new(-(d.as_secs() as i64), 0),
                    n => TimeSpec::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - n),
                }
            }
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<TimeSpec>,
}

impl ManualClock {
    pub fn new(start: TimeSpec) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, time: TimeSpec) {
        *self.now.lock() = time;
    }

    /// Moves the clock forward by `nanos` nanoseconds.
    pub fn advance(&self, nanos: u64) {
        let mut now = self.now.lock();
        *now = now.add_nanos(nanos);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeSpec {
        *self.now.lock()
    }
}
