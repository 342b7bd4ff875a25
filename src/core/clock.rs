//! Reference clocks shared by the controller and the pipelines.
//!
//! Every component reads time through a `Clock` so that the whole engine can
//! be driven by a hand-advanced clock in headless runs and tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::time::{self, Time};

/// Monotonic time source in nanoseconds
pub trait Clock: Send + Sync {
    /// Nanoseconds since the clock's epoch
    fn now(&self) -> Time;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Time {
        time::from_duration(self.epoch.elapsed())
    }
}

/// Clock that only moves when told to. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Time) {
        self.nanos.fetch_add(by.max(0), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        self.nanos.load(Ordering::Relaxed)
    }
}
