//! Clock-driven playhead.
//!
//! The position is `anchor + (now - started_at) * rate` while running and the
//! frozen anchor otherwise, always clamped to the media duration.

use crate::core::time::{self, Time, ZERO};

#[derive(Debug, Clone, PartialEq)]
pub struct Playhead {
    anchor: Time,             // position when last started/seeked/paused
    started_at: Option<Time>, // clock reading when running
    duration: Time,
    rate: f64,
}

impl Playhead {
    pub fn new(duration: Time) -> Self {
        Self {
            anchor: ZERO,
            started_at: None,
            duration: duration.max(ZERO),
            rate: 1.0,
        }
    }

    /// Playback speed multiplier. A value slightly off 1.0 models a drifting decoder.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn duration(&self) -> Time {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn position(&self, now: Time) -> Time {
        let raw = match self.started_at {
            Some(start) => {
                let elapsed = (now - start).max(ZERO) as f64 * self.rate;
                self.anchor.saturating_add(elapsed.round() as Time)
            }
            None => self.anchor,
        };
        time::clamp_to_duration(raw, self.duration)
    }

    /// True once a running playhead has reached the end
    pub fn at_end(&self, now: Time) -> bool {
        self.duration > ZERO && self.position(now) >= self.duration
    }

    pub fn start(&mut self, now: Time) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn stop(&mut self, now: Time) {
        self.anchor = self.position(now);
        self.started_at = None;
    }

    pub fn seek(&mut self, position: Time, now: Time) {
        self.anchor = time::clamp_to_duration(position, self.duration);
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }
}
