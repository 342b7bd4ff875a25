//! Offset between the two streams: `secondary = primary + offset`.

use crate::core::time::{Time, ZERO};

/// Signed offset of the secondary stream relative to the primary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetModel {
    offset: Time, // nanoseconds
}

impl OffsetModel {
    pub fn new(offset: Time) -> Self {
        Self { offset }
    }

    pub fn get(&self) -> Time {
        self.offset
    }

    pub fn set(&mut self, offset: Time) {
        self.offset = offset;
    }

    pub fn reset(&mut self) {
        self.offset = ZERO;
    }

    /// Flip the sign after the roles are swapped, keeping the absolute alignment
    pub fn invert(&mut self) {
        self.offset = self.offset.saturating_neg();
    }

    /// Primary-relative position to secondary-relative position.
    /// Not clamped; callers clamp against the target stream's duration.
    pub fn to_secondary_time(&self, primary_time: Time) -> Time {
        primary_time.saturating_add(self.offset)
    }

    pub fn to_primary_time(&self, secondary_time: Time) -> Time {
        secondary_time.saturating_sub(self.offset)
    }
}
