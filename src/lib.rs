//! Two-stream synchronization and overlay engine.
//!
//! Keeps a secondary video locked to a primary one at a user-set offset,
//! corrects drift while both play, and manages the geometry of the
//! picture-in-picture overlay. Rendering is left to the host.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod media;
pub mod overlay;
pub mod playback;

pub use config::{OverlayConfig, SyncConfig};
pub use error::{EngineUnavailable, LoadError, NotReadyError, PipelineError, SyncError};
pub use playback::{PlaybackCommand, PlaybackEngine, PlaybackResponse, StreamRole, SyncController, SyncState};
