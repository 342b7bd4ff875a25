//! Command loop around the sync controller.
//! Uses crossbeam channels so input threads never touch playback state directly.

use std::path::PathBuf;
use std::time::Duration;

use crossbeam::channel::{self, select};
use egui::Pos2;
use tracing::{debug, info, warn};

use crate::core::time::Time;
use crate::error::SyncError;
use crate::playback::drift::DriftOutcome;
use crate::playback::roles::StreamRole;
use crate::playback::sync::{SyncController, SyncState};

/// Responses are dropped rather than queued without bound when nobody reads them
const RESPONSE_CAPACITY: usize = 256;

/// Command sent to the playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Load { role: StreamRole, path: PathBuf },
    Play,
    Pause,
    TogglePlay,
    Seek(Time),      // nanoseconds, primary timeline
    /// Seek-bar pressed
    BeginScrub,
    ScrubTo(Time),
    /// Seek-bar released at a primary position
    EndScrub(Time),
    SetOffset(Time), // nanoseconds
    SetVolume { role: StreamRole, level: f32 },
    Swap,
    ToggleOverlay,
    ResizeHost { width: f32, height: f32 },
    PointerPressed(Pos2),
    PointerMoved(Pos2),
    PointerReleased,
    /// Publish the current state without changing anything
    Report,
    Shutdown,
}

/// Response from the playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackResponse {
    StateChanged(SyncState),
    DriftCorrected { error: Time, target: Time },
    Error(SyncError),
    Stopped,
}

/// Owns the controller and applies commands and ticks in arrival order
pub struct PlaybackEngine {
    controller: SyncController,
    command_tx: channel::Sender<PlaybackCommand>,
    command_rx: channel::Receiver<PlaybackCommand>,
    response_tx: channel::Sender<PlaybackResponse>,
    response_rx: channel::Receiver<PlaybackResponse>,
}

impl PlaybackEngine {
    pub fn new(controller: SyncController) -> Self {
        let (command_tx, command_rx) = channel::unbounded();
        let (response_tx, response_rx) = channel::bounded(RESPONSE_CAPACITY);
        Self {
            controller,
            command_tx,
            command_rx,
            response_tx,
            response_rx,
        }
    }

    /// Handle for input threads
    pub fn sender(&self) -> channel::Sender<PlaybackCommand> {
        self.command_tx.clone()
    }

    pub fn responses(&self) -> channel::Receiver<PlaybackResponse> {
        self.response_rx.clone()
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SyncController {
        &mut self.controller
    }

    /// Apply one command to the controller
    pub fn process_command(&mut self, command: PlaybackCommand) -> Result<(), SyncError> {
        let controller = &mut self.controller;
        match command {
            PlaybackCommand::Load { role, path } => controller.load(role, path)?,
            PlaybackCommand::Play => controller.play()?,
            PlaybackCommand::Pause => controller.pause()?,
            PlaybackCommand::TogglePlay => controller.toggle_play()?,
            PlaybackCommand::Seek(position) => controller.seek(position)?,
            PlaybackCommand::BeginScrub => controller.begin_scrub()?,
            PlaybackCommand::ScrubTo(position) => controller.scrub_to(position)?,
            PlaybackCommand::EndScrub(position) => controller.end_scrub(position)?,
            PlaybackCommand::SetOffset(offset) => controller.set_offset(offset)?,
            PlaybackCommand::SetVolume { role, level } => controller.set_volume(role, level)?,
            PlaybackCommand::Swap => controller.swap(),
            PlaybackCommand::ToggleOverlay => {
                controller.toggle_overlay();
            }
            PlaybackCommand::ResizeHost { width, height } => {
                controller.overlay_mut().set_host_size(width, height);
            }
            PlaybackCommand::PointerPressed(pos) => {
                controller.overlay_mut().pointer_pressed(pos);
            }
            PlaybackCommand::PointerMoved(pos) => controller.overlay_mut().pointer_moved(pos),
            PlaybackCommand::PointerReleased => controller.overlay_mut().pointer_released(),
            PlaybackCommand::Report | PlaybackCommand::Shutdown => {}
        }
        Ok(())
    }

    /// Apply a command and publish the result. Returns false on shutdown.
    pub fn dispatch(&mut self, command: PlaybackCommand) -> bool {
        if command == PlaybackCommand::Shutdown {
            return false;
        }
        debug!(?command, "command");
        if let Err(err) = self.process_command(command) {
            warn!(error = %err, "command failed");
            self.publish(PlaybackResponse::Error(err));
        }
        self.publish(PlaybackResponse::StateChanged(self.controller.state()));
        true
    }

    /// Apply everything already queued. Returns false if a shutdown was seen.
    pub fn pump(&mut self) -> bool {
        while let Ok(command) = self.command_rx.try_recv() {
            if !self.dispatch(command) {
                return false;
            }
        }
        true
    }

    /// Host tick. Publishes only when something the user can see changed.
    pub fn tick(&mut self) -> DriftOutcome {
        let before = self.controller.transport();
        let outcome = self.controller.tick();

        if let DriftOutcome::Corrected { error, target, .. } = outcome {
            self.publish(PlaybackResponse::DriftCorrected { error, target });
        }
        if self.controller.transport() != before {
            self.publish(PlaybackResponse::StateChanged(self.controller.state()));
        }
        outcome
    }

    /// Block on commands and ticks until `Shutdown` arrives
    pub fn run(&mut self, interval: Duration) {
        let commands = self.command_rx.clone();
        let ticker = channel::tick(interval);
        info!(interval_ms = interval.as_millis() as u64, "playback engine running");

        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(command) => {
                        if !self.dispatch(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.tick();
                }
            }
        }

        if let Err(err) = self.controller.pause() {
            debug!(error = %err, "pause on shutdown");
        }
        self.publish(PlaybackResponse::Stopped);
        info!("playback engine stopped");
    }

    fn publish(&self, response: PlaybackResponse) {
        if self.response_tx.try_send(response).is_err() {
            debug!("response queue full, dropping update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::core::clock::ManualClock;
    use crate::core::time::{from_millis, from_seconds};
    use crate::media::probe::CatalogProbe;
    use crate::playback::state::TransportState;
    use std::sync::Arc;
    use std::thread;

    fn engine(clock: &ManualClock) -> PlaybackEngine {
        let probe = CatalogProbe::new()
            .with_media("reaction.mkv", from_seconds(600.0))
            .with_media("source.mkv", from_seconds(580.0));
        let controller =
            SyncController::headless(&SyncConfig::default(), Arc::new(clock.clone()), Arc::new(probe));
        PlaybackEngine::new(controller)
    }

    fn load_both(tx: &channel::Sender<PlaybackCommand>) {
        tx.send(PlaybackCommand::Load {
            role: StreamRole::Primary,
            path: "reaction.mkv".into(),
        })
        .unwrap();
        tx.send(PlaybackCommand::Load {
            role: StreamRole::Secondary,
            path: "source.mkv".into(),
        })
        .unwrap();
    }

    #[test]
    fn test_commands_apply_in_order() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let tx = engine.sender();
        load_both(&tx);
        tx.send(PlaybackCommand::SetOffset(from_seconds(5.0))).unwrap();
        tx.send(PlaybackCommand::Seek(from_seconds(10.0))).unwrap();
        tx.send(PlaybackCommand::Play).unwrap();

        assert!(engine.pump());
        let state = engine.controller().state();
        assert_eq!(state.transport, TransportState::Playing);
        assert_eq!(state.primary.position, from_seconds(10.0));
        assert_eq!(state.secondary.position, from_seconds(15.0));
    }

    #[test]
    fn test_scrub_commands() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let tx = engine.sender();
        load_both(&tx);
        tx.send(PlaybackCommand::Play).unwrap();
        tx.send(PlaybackCommand::BeginScrub).unwrap();
        tx.send(PlaybackCommand::ScrubTo(from_seconds(30.0))).unwrap();
        engine.pump();
        assert!(engine.controller().is_scrubbing());
        assert_eq!(engine.controller().transport(), TransportState::Paused);

        tx.send(PlaybackCommand::EndScrub(from_seconds(45.0))).unwrap();
        engine.pump();
        let state = engine.controller().state();
        assert!(!state.scrubbing);
        assert_eq!(state.transport, TransportState::Playing);
        assert_eq!(state.primary.position, from_seconds(45.0));
    }

    #[test]
    fn test_error_is_reported() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let responses = engine.responses();

        assert!(engine.dispatch(PlaybackCommand::Play));
        let first = responses.try_recv().unwrap();
        assert!(matches!(first, PlaybackResponse::Error(SyncError::NotReady(_))));
        assert!(matches!(responses.try_recv().unwrap(), PlaybackResponse::StateChanged(_)));
    }

    #[test]
    fn test_pointer_commands_move_overlay() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        engine.dispatch(PlaybackCommand::ToggleOverlay);
        let start = engine.controller().overlay().geometry();

        engine.dispatch(PlaybackCommand::PointerPressed(egui::pos2(start.x + 50.0, start.y + 50.0)));
        engine.dispatch(PlaybackCommand::PointerMoved(egui::pos2(start.x + 150.0, start.y + 90.0)));
        engine.dispatch(PlaybackCommand::PointerReleased);

        let moved = engine.controller().overlay().geometry();
        assert_eq!(moved.x, start.x + 100.0);
        assert_eq!(moved.y, start.y + 40.0);
        assert_eq!(moved.width, start.width);
    }

    #[test]
    fn test_tick_publishes_end_of_stream_pause() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let tx = engine.sender();
        load_both(&tx);
        tx.send(PlaybackCommand::Seek(from_seconds(599.0))).unwrap();
        tx.send(PlaybackCommand::Play).unwrap();
        engine.pump();
        let responses = engine.responses();
        while responses.try_recv().is_ok() {}

        for _ in 0..8 {
            clock.advance(from_millis(250));
            engine.tick();
        }
        assert_eq!(engine.controller().transport(), TransportState::Paused);
        let published = responses.try_iter().any(|r| {
            matches!(r, PlaybackResponse::StateChanged(ref s) if s.transport == TransportState::Paused)
        });
        assert!(published);
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let clock = ManualClock::new();
        let mut engine = engine(&clock);
        let tx = engine.sender();
        let responses = engine.responses();

        let worker = thread::spawn(move || {
            engine.run(Duration::from_millis(5));
            engine
        });
        load_both(&tx);
        tx.send(PlaybackCommand::Shutdown).unwrap();
        let engine = worker.join().unwrap();

        assert!(engine.controller().pipeline_for(StreamRole::Secondary).is_loaded());
        assert!(responses.try_iter().any(|r| r == PlaybackResponse::Stopped));
    }
}
