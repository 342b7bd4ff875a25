//! Playback coordination: stream roles, offset, drift monitoring and the
//! controller that drives both pipelines.

pub mod drift;
pub mod engine;
pub mod offset;
pub mod roles;
pub mod state;
pub mod sync;

pub use drift::{DriftMonitor, DriftOutcome, DriftSample, SkipReason};
pub use engine::{PlaybackCommand, PlaybackEngine, PlaybackResponse};
pub use offset::OffsetModel;
pub use roles::{RoleRegistry, StreamHandle, StreamRole};
pub use state::TransportState;
pub use sync::{StreamStatus, SyncController, SyncState};
