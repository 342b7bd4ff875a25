//! Drift monitor.
//!
//! Each stream decodes on its own clock, so two streams started together slowly
//! walk apart. The monitor samples both positions on a fixed interval while the
//! pair is playing and asks for a corrective seek of the secondary once the
//! error passes the threshold. Ticks that land while the pipelines are busy are
//! dropped, never queued.

use crate::core::time::{self, Time};
use crate::playback::offset::OffsetModel;
use crate::playback::state::TransportState;

/// Positions of both streams taken within one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftSample {
    pub primary_position: Time,
    pub secondary_position: Time,
    pub secondary_duration: Time,
    pub measured_at: Time,
}

impl DriftSample {
    /// Where the secondary should be, clamped to its own bounds
    pub fn expected_secondary(&self, offset: &OffsetModel) -> Time {
        time::clamp_to_duration(offset.to_secondary_time(self.primary_position), self.secondary_duration)
    }

    /// Positive when the secondary runs ahead
    pub fn error(&self, offset: &OffsetModel) -> Time {
        self.secondary_position - self.expected_secondary(offset)
    }
}

/// Why a due tick did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPlaying,
    Busy,
}

/// Result of polling the monitor on a host tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftOutcome {
    /// Monitor is cancelled
    Inactive,
    /// Armed, but the interval has not elapsed
    NotDue,
    Skipped(SkipReason),
    InSync { sample: DriftSample, error: Time },
    /// The secondary must be seeked to `target`
    Corrected { sample: DriftSample, error: Time, target: Time },
}

/// Scheduled drift check with an idle guard
#[derive(Debug, Clone)]
pub struct DriftMonitor {
    interval: Time,
    threshold: Time,
    next_due: Option<Time>,
}

impl DriftMonitor {
    pub fn new(interval: Time, threshold: Time) -> Self {
        Self {
            interval: interval.max(1),
            threshold: threshold.max(0),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Time {
        self.interval
    }

    pub fn threshold(&self) -> Time {
        self.threshold
    }

    /// Schedule the first check one interval from `now`
    pub fn arm(&mut self, now: Time) {
        self.next_due = Some(now + self.interval);
    }

    /// Stop checking until armed again
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Compare a sample against the offset. Returns the seek target when out of tolerance.
    pub fn evaluate(&self, sample: &DriftSample, offset: &OffsetModel) -> Option<Time> {
        let error = sample.error(offset);
        if error.abs() > self.threshold {
            Some(sample.expected_secondary(offset))
        } else {
            None
        }
    }

    /// Run one scheduled check. `sample` is only called when the check actually runs.
    pub fn poll(
        &mut self,
        now: Time,
        transport: TransportState,
        idle: bool,
        offset: &OffsetModel,
        sample: impl FnOnce() -> DriftSample,
    ) -> DriftOutcome {
        let Some(due) = self.next_due else {
            return DriftOutcome::Inactive;
        };
        if now < due {
            return DriftOutcome::NotDue;
        }

        // Missed beats collapse into one
        self.next_due = Some(now + self.interval);

        if !transport.is_playing() {
            return DriftOutcome::Skipped(SkipReason::NotPlaying);
        }
        if !idle {
            return DriftOutcome::Skipped(SkipReason::Busy);
        }

        let sample = sample();
        let error = sample.error(offset);
        match self.evaluate(&sample, offset) {
            Some(target) => DriftOutcome::Corrected { sample, error, target },
            None => DriftOutcome::InSync { sample, error },
        }
    }
}
