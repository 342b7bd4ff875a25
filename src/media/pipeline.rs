//! The capability set every media engine adapter exposes to the controller.
//!
//! Decoding and painting frames happen behind this trait; the sync core only
//! ever asks for transport, volume and position.

use std::path::{Path, PathBuf};

use crate::core::time::Time;
use crate::error::{LoadError, PipelineError};

/// Metadata of the media currently loaded in a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub duration: Time, // nanoseconds
    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn new(path: impl Into<PathBuf>, duration: Time) -> Self {
        Self {
            path: path.into(),
            duration,
            has_video: true,
            has_audio: true,
        }
    }
}

/// Invoked by a pipeline when playback hits the end of its media
pub type EndCallback = Box<dyn FnMut() + Send>;

/// One media engine instance
pub trait MediaPipeline: Send {
    /// Open media. On failure the previously loaded media must stay active.
    /// Fresh media starts paused at zero.
    fn load(&mut self, path: &Path) -> Result<MediaInfo, LoadError>;

    /// Currently loaded media, if any
    fn media(&self) -> Option<&MediaInfo>;

    fn play(&mut self) -> Result<(), PipelineError>;

    fn pause(&mut self) -> Result<(), PipelineError>;

    /// Seek to an absolute position (nanoseconds), already clamped by the caller
    fn seek(&mut self, position: Time) -> Result<(), PipelineError>;

    /// Volume in `[0.0, 1.0]`
    fn set_volume(&mut self, level: f32) -> Result<(), PipelineError>;

    fn volume(&self) -> f32;

    /// Reported playback position (nanoseconds)
    fn position(&self) -> Time;

    /// Duration of the loaded media, zero when nothing is loaded
    fn duration(&self) -> Time;

    fn is_playing(&self) -> bool;

    /// False while a seek or load is still settling inside the engine
    fn is_idle(&self) -> bool {
        true
    }

    /// Register the end-of-stream notification. Replaces any earlier callback.
    fn on_end_reached(&mut self, callback: EndCallback);

    /// Housekeeping driven once per host tick (end detection, seek settling)
    fn service(&mut self) {}

    fn is_loaded(&self) -> bool {
        self.media().is_some()
    }
}
