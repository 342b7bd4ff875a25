//! Logical transport state shared by the stream pair.

use std::fmt;

/// Transport state of the pair as a whole.
/// While `Playing`, both pipelines are playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Nothing started yet, or the last load failed
    #[default]
    Stopped,
    /// Both pipelines running
    Playing,
    /// Both pipelines held
    Paused,
}

impl TransportState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Check if stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
        }
    }
}
