//! Synchronization controller.
//!
//! Owns both pipelines, the role mapping, the offset, the drift monitor and the
//! overlay, and turns every user command into calls on both streams. All state
//! lives here; nothing is global. Runs on one logical thread: commands and
//! ticks are applied strictly one after another.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::core::clock::Clock;
use crate::core::time::{self, Time};
use crate::error::{LoadError, NotReadyError, SyncError};
use crate::media::headless::HeadlessPipeline;
use crate::media::pipeline::{MediaInfo, MediaPipeline};
use crate::media::probe::Probe;
use crate::overlay::{OverlayGeometry, OverlayManager};
use crate::playback::drift::{DriftMonitor, DriftOutcome, DriftSample};
use crate::playback::offset::OffsetModel;
use crate::playback::roles::{RoleRegistry, StreamHandle, StreamRole};
use crate::playback::state::TransportState;

/// What the renderer needs to know about one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStatus {
    pub handle: StreamHandle,
    pub media: Option<MediaInfo>,
    pub position: Time, // nanoseconds
    pub duration: Time, // nanoseconds
    pub volume: f32,
    pub playing: bool,
}

/// Snapshot polled by the renderer every tick
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub transport: TransportState,
    pub offset: Time, // nanoseconds, secondary relative to primary
    pub roles: RoleRegistry,
    pub overlay: OverlayGeometry,
    pub primary: StreamStatus,
    pub secondary: StreamStatus,
    pub idle: bool,
    /// A seek-bar drag is in progress
    pub scrubbing: bool,
}

/// Seek-bar drag in progress
#[derive(Debug, Clone, Copy)]
struct Scrub {
    resume: bool, // pair was playing when the drag began
}

/// Façade coordinating two media pipelines
pub struct SyncController {
    clock: Arc<dyn Clock>,
    pipelines: [Box<dyn MediaPipeline>; 2],
    roles: RoleRegistry,
    offset: OffsetModel,
    transport: TransportState,
    drift: DriftMonitor,
    overlay: OverlayManager,
    scrub: Option<Scrub>,
    end_rx: channel::Receiver<StreamHandle>,
}

impl SyncController {
    /// Build around two pipelines. `a` starts as primary, `b` as secondary.
    pub fn new(
        config: &SyncConfig,
        clock: Arc<dyn Clock>,
        mut a: Box<dyn MediaPipeline>,
        mut b: Box<dyn MediaPipeline>,
    ) -> Self {
        let (end_tx, end_rx) = channel::unbounded();
        for (handle, pipeline) in [(StreamHandle::A, &mut a), (StreamHandle::B, &mut b)] {
            let tx = end_tx.clone();
            pipeline.on_end_reached(Box::new(move || {
                // Controller gone means nobody to notify
                let _ = tx.send(handle);
            }));
        }

        Self {
            clock,
            pipelines: [a, b],
            roles: RoleRegistry::new(),
            offset: OffsetModel::default(),
            transport: TransportState::Stopped,
            drift: DriftMonitor::new(config.drift_interval(), config.correction_threshold()),
            overlay: OverlayManager::from_config(&config.overlay, config.host_size()),
            scrub: None,
            end_rx,
        }
    }

    /// Controller over two headless pipelines sharing `clock` and `probe`
    pub fn headless(config: &SyncConfig, clock: Arc<dyn Clock>, probe: Arc<dyn Probe>) -> Self {
        let timeout: Duration = config.load_timeout();
        let a = HeadlessPipeline::new("stream-a", Arc::clone(&clock), Arc::clone(&probe), timeout);
        let b = HeadlessPipeline::new("stream-b", Arc::clone(&clock), probe, timeout);
        Self::new(config, clock, Box::new(a), Box::new(b))
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn offset(&self) -> Time {
        self.offset.get()
    }

    pub fn roles(&self) -> RoleRegistry {
        self.roles
    }

    pub fn overlay(&self) -> &OverlayManager {
        &self.overlay
    }

    /// Pointer gestures and host resizes go straight to the overlay; playback is unaffected
    pub fn overlay_mut(&mut self) -> &mut OverlayManager {
        &mut self.overlay
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    pub fn drift_monitor(&self) -> &DriftMonitor {
        &self.drift
    }

    pub fn pipeline(&self, handle: StreamHandle) -> &dyn MediaPipeline {
        self.pipelines[handle.index()].as_ref()
    }

    /// Pipeline currently bound to `role`
    pub fn pipeline_for(&self, role: StreamRole) -> &dyn MediaPipeline {
        self.pipeline(self.roles.handle(role))
    }

    fn pipeline_mut(&mut self, handle: StreamHandle) -> &mut dyn MediaPipeline {
        self.pipelines[handle.index()].as_mut()
    }

    /// True when no pipeline has a seek or load settling
    pub fn is_idle(&self) -> bool {
        self.pipelines.iter().all(|p| p.is_idle())
    }

    /// Load media into the pipeline bound to `role`.
    ///
    /// On failure the previous media stays, and both streams are paused with the
    /// transport forced to `Stopped`. A new secondary resets the offset to zero.
    pub fn load(&mut self, role: StreamRole, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let handle = self.roles.handle(role);

        match self.pipeline_mut(handle).load(path) {
            Err(err) => {
                warn!(%role, %handle, path = %path.display(), error = %err, "load failed");
                if let Err(pause_err) = self.halt(TransportState::Stopped) {
                    warn!(error = %pause_err, "could not pause after failed load");
                }
                Err(err)
            }
            Ok(info) => {
                info!(
                    %role,
                    %handle,
                    path = %info.path.display(),
                    duration = %time::format_time(info.duration),
                    "media loaded"
                );
                if role == StreamRole::Secondary {
                    self.offset.reset();
                }
                // Fresh media starts paused, so a running pair must follow
                if self.transport.is_playing() {
                    if let Err(pause_err) = self.halt(TransportState::Paused) {
                        warn!(error = %pause_err, "could not pause after load");
                    }
                }
                if let Err(align_err) = self.realign_secondary() {
                    warn!(error = %align_err, "could not align secondary after load");
                }
                Ok(())
            }
        }
    }

    /// Start both streams. Neither starts unless both have media.
    /// A primary parked on its last frame restarts from the beginning.
    pub fn play(&mut self) -> Result<(), SyncError> {
        if self.transport.is_playing() {
            return Ok(());
        }
        self.ensure_ready()?;

        let primary = self.pipeline_for(StreamRole::Primary);
        if primary.duration() > time::ZERO && primary.position() >= primary.duration() {
            info!("primary is at its end, restarting from the beginning");
            self.seek(time::ZERO)?;
        }

        let previous = self.transport;
        for handle in [self.roles.primary(), self.roles.secondary()] {
            if let Err(source) = self.pipeline_mut(handle).play() {
                warn!(%handle, error = %source, "play failed, pausing both streams");
                if let Err(pause_err) = self.halt(previous) {
                    warn!(error = %pause_err, "could not pause after failed play");
                }
                return Err(SyncError::pipeline(handle, source));
            }
        }

        self.transport = TransportState::Playing;
        self.drift.arm(self.clock.now());
        info!(position = %time::format_time(self.pipeline_for(StreamRole::Primary).position()), "playing");
        Ok(())
    }

    /// Hold both streams, then line the secondary up exactly with the primary
    pub fn pause(&mut self) -> Result<(), SyncError> {
        let next = if self.transport.is_stopped() {
            TransportState::Stopped
        } else {
            TransportState::Paused
        };
        self.halt(next)?;
        self.realign_secondary()?;
        debug!(position = %time::format_time(self.pipeline_for(StreamRole::Primary).position()), "paused");
        Ok(())
    }

    /// Single play/pause button
    pub fn toggle_play(&mut self) -> Result<(), SyncError> {
        if self.transport.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek both streams to a primary-relative position.
    /// Each target is clamped to its own stream; transport is unchanged.
    pub fn seek(&mut self, primary_time: Time) -> Result<(), SyncError> {
        let primary = self.roles.primary();
        let secondary = self.roles.secondary();

        let primary_target = if self.pipeline(primary).is_loaded() {
            time::clamp_to_duration(primary_time, self.pipeline(primary).duration())
        } else {
            primary_time.max(time::ZERO)
        };

        let mut first_error = None;
        if self.pipeline(primary).is_loaded() {
            if let Err(source) = self.pipeline_mut(primary).seek(primary_target) {
                first_error = Some(SyncError::pipeline(primary, source));
            }
        }

        let secondary_target = self.secondary_target(primary_target);
        if self.pipeline(secondary).is_loaded() {
            if let Err(source) = self.pipeline_mut(secondary).seek(secondary_target) {
                first_error.get_or_insert(SyncError::pipeline(secondary, source));
            }
        }

        // Give the seek a full interval to settle before the next drift check
        if self.transport.is_playing() {
            self.drift.arm(self.clock.now());
        }
        if let Err(err) = self.resume_stalled() {
            first_error.get_or_insert(err);
        }

        debug!(
            primary = %time::format_time(primary_target),
            secondary = %time::format_time(secondary_target),
            "seek"
        );
        first_error.map_or(Ok(()), Err)
    }

    /// Change the offset and move the secondary to match right away
    pub fn set_offset(&mut self, offset: Time) -> Result<(), SyncError> {
        self.offset.set(offset);
        info!(offset = %time::format_time(offset), "offset changed");
        self.realign_secondary()?;
        self.resume_stalled()
    }

    /// Seek-bar press: hold both streams until the drag ends
    pub fn begin_scrub(&mut self) -> Result<(), SyncError> {
        if self.scrub.is_some() {
            return Ok(());
        }
        let resume = self.transport.is_playing();
        self.scrub = Some(Scrub { resume });
        debug!(resume, "scrub started");
        if resume {
            self.halt(TransportState::Paused)?;
        }
        Ok(())
    }

    /// Seek-bar drag: move both streams without resuming
    pub fn scrub_to(&mut self, primary_time: Time) -> Result<(), SyncError> {
        self.seek(primary_time)
    }

    /// Seek-bar release: settle on `primary_time`, then resume if the pair was playing
    pub fn end_scrub(&mut self, primary_time: Time) -> Result<(), SyncError> {
        let scrub = self.scrub.take();
        self.seek(primary_time)?;
        debug!(position = %time::format_time(primary_time), "scrub ended");
        match scrub {
            Some(Scrub { resume: true }) => self.play(),
            _ => Ok(()),
        }
    }

    /// Volume of the stream bound to `role`, clamped to `[0.0, 1.0]`
    pub fn set_volume(&mut self, role: StreamRole, level: f32) -> Result<(), SyncError> {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        let handle = self.roles.handle(role);
        self.pipeline_mut(handle)
            .set_volume(level)
            .map_err(|source| SyncError::pipeline(handle, source))?;
        debug!(%role, %handle, level, "volume");
        Ok(())
    }

    /// Exchange primary and secondary. No pipeline is touched; the offset is
    /// negated so both files stay aligned the same way.
    pub fn swap(&mut self) {
        self.roles.swap();
        self.offset.invert();
        info!(
            primary = %self.roles.primary(),
            secondary = %self.roles.secondary(),
            offset = %time::format_time(self.offset.get()),
            "roles swapped"
        );
    }

    /// Show or hide the overlay; geometry is kept
    pub fn toggle_overlay(&mut self) -> bool {
        let visible = self.overlay.toggle_visible();
        debug!(visible, "overlay toggled");
        visible
    }

    /// One host tick: pipeline housekeeping, end-of-stream handling, drift check
    pub fn tick(&mut self) -> DriftOutcome {
        for pipeline in self.pipelines.iter_mut() {
            pipeline.service();
        }
        self.handle_end_events();

        let now = self.clock.now();
        // A drag on the seek bar owns the secondary's position
        let idle = self.is_idle() && self.scrub.is_none();
        let offset = self.offset;
        let primary = self.roles.primary();
        let secondary = self.roles.secondary();
        let pipelines = &self.pipelines;

        let outcome = self.drift.poll(now, self.transport, idle, &offset, || DriftSample {
            primary_position: pipelines[primary.index()].position(),
            secondary_position: pipelines[secondary.index()].position(),
            secondary_duration: pipelines[secondary.index()].duration(),
            measured_at: now,
        });

        if let DriftOutcome::Corrected { error, target, .. } = outcome {
            info!(
                error_ms = time::to_millis(error),
                target = %time::format_time(target),
                "correcting drift"
            );
            if let Err(source) = self.pipeline_mut(secondary).seek(target) {
                warn!(%secondary, error = %source, "drift correction failed");
            } else if let Err(err) = self.resume_stalled() {
                warn!(error = %err, "could not resume after drift correction");
            }
        }
        outcome
    }

    pub fn state(&self) -> SyncState {
        SyncState {
            transport: self.transport,
            offset: self.offset.get(),
            roles: self.roles,
            overlay: self.overlay.geometry(),
            primary: self.status(self.roles.primary()),
            secondary: self.status(self.roles.secondary()),
            idle: self.is_idle(),
            scrubbing: self.scrub.is_some(),
        }
    }

    fn status(&self, handle: StreamHandle) -> StreamStatus {
        let pipeline = self.pipeline(handle);
        StreamStatus {
            handle,
            media: pipeline.media().cloned(),
            position: pipeline.position(),
            duration: pipeline.duration(),
            volume: pipeline.volume(),
            playing: pipeline.is_playing(),
        }
    }

    fn ensure_ready(&self) -> Result<(), NotReadyError> {
        for role in [StreamRole::Primary, StreamRole::Secondary] {
            if !self.pipeline_for(role).is_loaded() {
                return Err(NotReadyError { missing: role });
            }
        }
        Ok(())
    }

    /// Secondary position for a primary position, clamped to the secondary's bounds
    fn secondary_target(&self, primary_time: Time) -> Time {
        let secondary = self.pipeline_for(StreamRole::Secondary);
        time::clamp_to_duration(self.offset.to_secondary_time(primary_time), secondary.duration())
    }

    /// Seek the secondary to `primary + offset` when both have media
    fn realign_secondary(&mut self) -> Result<(), SyncError> {
        if self.ensure_ready().is_err() {
            return Ok(());
        }
        let primary_position = self.pipeline_for(StreamRole::Primary).position();
        let target = self.secondary_target(primary_position);
        let secondary = self.roles.secondary();
        self.pipeline_mut(secondary)
            .seek(target)
            .map_err(|source| SyncError::pipeline(secondary, source))
    }

    /// While playing, restart any pipeline that stopped at its end and has since
    /// been moved back before it
    fn resume_stalled(&mut self) -> Result<(), SyncError> {
        if !self.transport.is_playing() {
            return Ok(());
        }
        for handle in [self.roles.primary(), self.roles.secondary()] {
            let pipeline = self.pipeline(handle);
            if !pipeline.is_loaded() || pipeline.is_playing() || pipeline.position() >= pipeline.duration() {
                continue;
            }
            self.pipeline_mut(handle)
                .play()
                .map_err(|source| SyncError::pipeline(handle, source))?;
            debug!(%handle, "resumed after moving back from the end");
        }
        Ok(())
    }

    /// Pause every loaded pipeline and settle on `next`. Both are attempted even
    /// if one fails; the first failure is returned.
    fn halt(&mut self, next: TransportState) -> Result<(), SyncError> {
        let mut first_error = None;
        for handle in [self.roles.primary(), self.roles.secondary()] {
            if !self.pipeline(handle).is_loaded() {
                continue;
            }
            if let Err(source) = self.pipeline_mut(handle).pause() {
                first_error.get_or_insert(SyncError::pipeline(handle, source));
            }
        }
        self.transport = next;
        self.drift.cancel();
        first_error.map_or(Ok(()), Err)
    }

    fn handle_end_events(&mut self) {
        while let Ok(handle) = self.end_rx.try_recv() {
            match self.roles.role_of(handle) {
                StreamRole::Primary if self.transport.is_playing() => {
                    info!(%handle, "primary reached the end, pausing");
                    if let Err(err) = self.halt(TransportState::Paused) {
                        warn!(error = %err, "could not pause at end of stream");
                    }
                }
                StreamRole::Primary => {}
                StreamRole::Secondary => {
                    debug!(%handle, "secondary reached the end, holding last frame");
                }
            }
        }
    }
}
