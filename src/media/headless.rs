//! Headless pipeline adapter.
//!
//! Validates media through a `Probe` on a worker thread, bounded by a load
//! timeout, and runs a clock-driven playhead. It renders nothing; it gives the
//! sync core a real transport to drive when no display engine is attached.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;

use crate::core::clock::Clock;
use crate::core::time::{Time, ZERO};
use crate::error::{LoadError, PipelineError};
use crate::media::pipeline::{EndCallback, MediaInfo, MediaPipeline};
use crate::media::playhead::Playhead;
use crate::media::probe::Probe;

/// Pipeline driven by a `Clock` instead of a decoder
pub struct HeadlessPipeline {
    name: String,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn Probe>,
    load_timeout: Duration,
    media: Option<MediaInfo>,
    playhead: Playhead,
    rate: f64,
    volume: f32,
    seek_settle: Time,            // how long a seek keeps the pipeline busy
    settled_at: Option<Time>,     // clock reading when the last seek settles
    end_callback: Option<EndCallback>,
    end_reported: bool,
}

impl HeadlessPipeline {
    pub fn new(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn Probe>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            probe,
            load_timeout,
            media: None,
            playhead: Playhead::new(ZERO),
            rate: 1.0,
            volume: 1.0,
            seek_settle: ZERO,
            settled_at: None,
            end_callback: None,
            end_reported: false,
        }
    }

    /// Playback speed multiplier, used to model a decoder whose clock runs fast or slow
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self.playhead = self.playhead.clone().with_rate(rate);
        self
    }

    /// Keep the pipeline busy for `settle` after every seek
    pub fn with_seek_settle(mut self, settle: Time) -> Self {
        self.seek_settle = settle.max(ZERO);
        self
    }

    /// Run the probe on a worker so a stuck engine cannot hang the caller
    fn probe_with_timeout(&self, path: &Path) -> Result<MediaInfo, LoadError> {
        let (tx, rx) = channel::bounded(1);
        let probe = Arc::clone(&self.probe);
        let owned = path.to_path_buf();

        thread::Builder::new()
            .name(format!("{}-probe", self.name))
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(probe.probe(&owned));
            })
            .map_err(|e| LoadError::Engine(e.to_string()))?;

        match rx.recv_timeout(self.load_timeout) {
            Ok(result) => result,
            Err(channel::RecvTimeoutError::Timeout) => Err(LoadError::Timeout {
                path: path.to_path_buf(),
                timeout: self.load_timeout,
            }),
            Err(channel::RecvTimeoutError::Disconnected) => {
                Err(LoadError::Engine("probe worker exited without answering".to_string()))
            }
        }
    }
}

impl MediaPipeline for HeadlessPipeline {
    fn load(&mut self, path: &Path) -> Result<MediaInfo, LoadError> {
        let info = self.probe_with_timeout(path)?;

        self.playhead = Playhead::new(info.duration).with_rate(self.rate);
        self.settled_at = None;
        self.end_reported = false;
        self.media = Some(info.clone());
        tracing::debug!(pipeline = %self.name, path = %info.path.display(), duration_ns = info.duration, "media opened");
        Ok(info)
    }

    fn media(&self) -> Option<&MediaInfo> {
        self.media.as_ref()
    }

    fn play(&mut self) -> Result<(), PipelineError> {
        if self.media.is_none() {
            return Err(PipelineError::NotLoaded);
        }
        let now = self.clock.now();
        self.playhead.start(now);
        // Playing again from the end must report the end again
        self.end_reported = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PipelineError> {
        if self.media.is_none() {
            return Err(PipelineError::NotLoaded);
        }
        let now = self.clock.now();
        self.playhead.stop(now);
        Ok(())
    }

    fn seek(&mut self, position: Time) -> Result<(), PipelineError> {
        if self.media.is_none() {
            return Err(PipelineError::NotLoaded);
        }
        let now = self.clock.now();
        self.playhead.seek(position, now);
        if position < self.playhead.duration() {
            self.end_reported = false;
        }
        if self.seek_settle > ZERO {
            self.settled_at = Some(now + self.seek_settle);
        }
        Ok(())
    }

    fn set_volume(&mut self, level: f32) -> Result<(), PipelineError> {
        self.volume = level.clamp(0.0, 1.0);
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> Time {
        self.playhead.position(self.clock.now())
    }

    fn duration(&self) -> Time {
        self.media.as_ref().map_or(ZERO, |m| m.duration)
    }

    fn is_playing(&self) -> bool {
        self.playhead.is_running()
    }

    fn is_idle(&self) -> bool {
        self.settled_at.map_or(true, |at| self.clock.now() >= at)
    }

    fn on_end_reached(&mut self, callback: EndCallback) {
        self.end_callback = Some(callback);
    }

    fn service(&mut self) {
        let now = self.clock.now();
        if self.settled_at.is_some_and(|at| now >= at) {
            self.settled_at = None;
        }

        if self.media.is_some() && self.playhead.is_running() && self.playhead.at_end(now) {
            // Keep-open: hold the last frame instead of unloading
            self.playhead.stop(now);
            if !self.end_reported {
                self.end_reported = true;
                tracing::debug!(pipeline = %self.name, "end of stream");
                if let Some(callback) = self.end_callback.as_mut() {
                    callback();
                }
            }
        }
    }
}
