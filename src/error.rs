//! Error kinds surfaced by the synchronization core.

use std::path::PathBuf;
use std::time::Duration;

use crate::playback::roles::{StreamHandle, StreamRole};

/// Failure to open media in a pipeline. The previously loaded media stays active.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported media {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
    #[error("Load of {path} not acknowledged within {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },
    #[error("Media engine error: {0}")]
    Engine(String),
}

/// A transport command was issued before both streams had media
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not ready: no media loaded for the {missing} stream")]
pub struct NotReadyError {
    pub missing: StreamRole,
}

/// The native media library could not be initialized. Fatal at startup only.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Media engine unavailable: {0}")]
pub struct EngineUnavailable(pub String);

/// Failure reported by a single pipeline for a transport call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("No media loaded")]
    NotLoaded,
    #[error("Media engine error: {0}")]
    Engine(String),
}

/// Error type for the sync controller
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    NotReady(#[from] NotReadyError),
    #[error("Pipeline {handle} failed: {source}")]
    Pipeline {
        handle: StreamHandle,
        #[source]
        source: PipelineError,
    },
}

impl SyncError {
    pub(crate) fn pipeline(handle: StreamHandle, source: PipelineError) -> Self {
        SyncError::Pipeline { handle, source }
    }
}
