//! Media probing: validating a file and reading its duration before a pipeline
//! commits to it.
//!
//! All FFmpeg access is isolated in this module.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::time::{self, Time};
use crate::error::{EngineUnavailable, LoadError};
use crate::media::pipeline::MediaInfo;

/// Opens media far enough to know it can be played and how long it is
pub trait Probe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaInfo, LoadError>;
}

/// Initialize the native media library. Must succeed once at startup.
pub fn init_engine() -> Result<(), EngineUnavailable> {
    ffmpeg_next::init().map_err(|e| EngineUnavailable(e.to_string()))?;
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    tracing::debug!("libav initialized");
    Ok(())
}

/// Probe backed by libav (`avformat_open_input` + stream info)
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegProbe;

impl FfmpegProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Probe for FfmpegProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let input = ffmpeg_next::format::input(&path).map_err(|e| LoadError::Unsupported {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let has_video = input.streams().best(ffmpeg_next::media::Type::Video).is_some();
        let has_audio = input.streams().best(ffmpeg_next::media::Type::Audio).is_some();
        if !has_video && !has_audio {
            return Err(LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: "no audio or video stream".to_string(),
            });
        }

        // Container duration is in AV_TIME_BASE (microsecond) units
        let mut duration = if input.duration() > 0 {
            input.duration().saturating_mul(1000)
        } else {
            0
        };

        // Some containers only carry per-stream durations
        if duration <= 0 {
            duration = input
                .streams()
                .filter(|stream| stream.duration() > 0)
                .map(|stream| {
                    let base = f64::from(stream.time_base());
                    time::from_seconds(stream.duration() as f64 * base)
                })
                .max()
                .unwrap_or(0);
        }

        if duration <= 0 {
            return Err(LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: "unknown duration".to_string(),
            });
        }

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration,
            has_video,
            has_audio,
        })
    }
}

#[derive(Debug, Clone)]
enum CatalogEntry {
    Media(Time),
    Rejected(String),
    Stalled(Duration),
}

/// Probe answering from a fixed in-memory catalog, for headless runs and tests.
/// Paths not in the catalog are reported as not found.
#[derive(Debug, Clone, Default)]
pub struct CatalogProbe {
    entries: HashMap<PathBuf, CatalogEntry>,
}

impl CatalogProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playable media of the given duration
    pub fn with_media(mut self, path: impl Into<PathBuf>, duration: Time) -> Self {
        self.entries.insert(path.into(), CatalogEntry::Media(duration));
        self
    }

    /// Media the engine refuses to open
    pub fn with_rejected(mut self, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.entries
            .insert(path.into(), CatalogEntry::Rejected(reason.into()));
        self
    }

    /// Media whose probe blocks for `delay` and then succeeds with a one second duration
    pub fn with_stalled(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.entries.insert(path.into(), CatalogEntry::Stalled(delay));
        self
    }
}

impl Probe for CatalogProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, LoadError> {
        match self.entries.get(path) {
            Some(CatalogEntry::Media(duration)) => Ok(MediaInfo::new(path, *duration)),
            Some(CatalogEntry::Rejected(reason)) => Err(LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: reason.clone(),
            }),
            Some(CatalogEntry::Stalled(delay)) => {
                std::thread::sleep(*delay);
                Ok(MediaInfo::new(path, time::constants::NANOS_PER_SECOND))
            }
            None => Err(LoadError::NotFound(path.to_path_buf())),
        }
    }
}
