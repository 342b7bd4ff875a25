//! Core types shared across the crate.
//!
//! All time values are signed nanoseconds (`i64`).

pub mod clock;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use time::{Time, ZERO};
