//! End-to-end scenarios against headless pipelines and a hand-driven clock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reaction_sync::core::clock::ManualClock;
use reaction_sync::core::time::{self, from_millis, from_seconds, Time, ZERO};
use reaction_sync::media::{CatalogProbe, HeadlessPipeline};
use reaction_sync::overlay::ResizeHandle;
use reaction_sync::playback::{
    DriftOutcome, PlaybackCommand, PlaybackEngine, PlaybackResponse, StreamHandle, StreamRole,
    SyncController, TransportState,
};
use reaction_sync::{LoadError, NotReadyError, SyncConfig, SyncError};

const REACTION: &str = "reaction.mkv";
const SOURCE: &str = "source.mkv";

fn catalog() -> Arc<CatalogProbe> {
    Arc::new(
        CatalogProbe::new()
            .with_media(REACTION, from_seconds(600.0))
            .with_media(SOURCE, from_seconds(580.0))
            .with_rejected("broken.mkv", "moov atom not found")
            .with_stalled("network.mkv", Duration::from_secs(2)),
    )
}

fn controller(clock: &ManualClock, config: &SyncConfig, secondary_rate: f64) -> SyncController {
    let probe = catalog();
    let a = HeadlessPipeline::new("a", Arc::new(clock.clone()), probe.clone(), config.load_timeout());
    let b = HeadlessPipeline::new("b", Arc::new(clock.clone()), probe, config.load_timeout())
        .with_rate(secondary_rate);
    SyncController::new(config, Arc::new(clock.clone()), Box::new(a), Box::new(b))
}

fn loaded(clock: &ManualClock) -> SyncController {
    let mut c = controller(clock, &SyncConfig::default(), 1.0);
    c.load(StreamRole::Primary, REACTION).unwrap();
    c.load(StreamRole::Secondary, SOURCE).unwrap();
    c
}

fn run_for(c: &mut SyncController, clock: &ManualClock, total: Time) {
    let step = from_millis(250);
    let mut elapsed = ZERO;
    while elapsed < total {
        clock.advance(step);
        c.tick();
        elapsed += step;
    }
}

#[test]
fn test_offset_scenario() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    c.set_offset(from_seconds(5.0)).unwrap();

    c.seek(ZERO).unwrap();
    let state = c.state();
    assert_eq!(state.primary.position, ZERO);
    assert_eq!(state.secondary.position, from_seconds(5.0));

    c.play().unwrap();
    run_for(&mut c, &clock, from_seconds(100.0));
    c.pause().unwrap();

    let state = c.state();
    assert_eq!(state.transport, TransportState::Paused);
    assert_eq!(state.primary.position, from_seconds(100.0));
    let error = (state.secondary.position - from_seconds(105.0)).abs();
    assert!(error <= c.drift_monitor().threshold());
}

#[test]
fn test_toggle_overlay_twice() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    let before = c.state().overlay;
    c.toggle_overlay();
    c.toggle_overlay();
    assert_eq!(c.state().overlay, before);
}

#[test]
fn test_unreadable_secondary_keeps_previous_media() {
    let clock = ManualClock::new();
    let mut c = controller(&clock, &SyncConfig::default(), 1.0);

    // Nothing loaded yet: stays empty
    let err = c.load(StreamRole::Secondary, "missing.mkv").unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
    assert!(c.state().secondary.media.is_none());

    c.load(StreamRole::Primary, REACTION).unwrap();
    c.load(StreamRole::Secondary, SOURCE).unwrap();
    let err = c.load(StreamRole::Secondary, "broken.mkv").unwrap_err();
    assert!(matches!(err, LoadError::Unsupported { .. }));

    let state = c.state();
    assert_eq!(state.secondary.media.as_ref().unwrap().path, Path::new(SOURCE));
    assert_eq!(state.transport, TransportState::Stopped);
}

#[test]
fn test_load_times_out() {
    let clock = ManualClock::new();
    let config = SyncConfig::from_toml_str("load_timeout_ms = 50").unwrap();
    let mut c = controller(&clock, &config, 1.0);
    let err = c.load(StreamRole::Primary, "network.mkv").unwrap_err();
    assert!(matches!(err, LoadError::Timeout { .. }));
    assert!(c.state().primary.media.is_none());
}

#[test]
fn test_seek_past_end_clamps_both() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    c.set_offset(from_seconds(-30.0)).unwrap();
    c.seek(from_seconds(10_000.0)).unwrap();

    let state = c.state();
    assert_eq!(state.primary.position, from_seconds(600.0));
    // 600 - 30 fits inside the secondary's 580
    assert_eq!(state.secondary.position, from_seconds(570.0));
}

#[test]
fn test_double_swap_restores() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    c.set_offset(from_seconds(4.5)).unwrap();
    let before = c.state();

    c.swap();
    assert_eq!(c.roles().primary(), StreamHandle::B);
    assert_eq!(c.offset(), from_seconds(-4.5));
    c.swap();

    let after = c.state();
    assert_eq!(after.roles, before.roles);
    assert_eq!(after.offset, before.offset);
    assert_eq!(after.primary.position, before.primary.position);
}

#[test]
fn test_set_offset_while_playing_settles() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    c.play().unwrap();
    run_for(&mut c, &clock, from_seconds(20.0));

    c.set_offset(from_seconds(12.0)).unwrap();
    run_for(&mut c, &clock, from_millis(250));

    let state = c.state();
    assert_eq!(state.transport, TransportState::Playing);
    let expected = state.primary.position + from_seconds(12.0);
    assert!((state.secondary.position - expected).abs() <= c.drift_monitor().threshold());
}

#[test]
fn test_drift_stays_bounded_over_long_playback() {
    let clock = ManualClock::new();
    let config = SyncConfig::default();
    let mut c = controller(&clock, &config, 0.99);
    c.load(StreamRole::Primary, REACTION).unwrap();
    c.load(StreamRole::Secondary, SOURCE).unwrap();
    c.play().unwrap();

    let mut corrections = 0;
    for _ in 0..(4 * 300) {
        clock.advance(from_millis(250));
        if matches!(c.tick(), DriftOutcome::Corrected { .. }) {
            corrections += 1;
        }
        let state = c.state();
        let error = state.secondary.position - state.primary.position;
        assert!(error.abs() <= config.correction_threshold() + from_millis(5));
    }
    // 1% slow over 300s is 3s of drift without correction
    assert!(corrections >= 20, "only {corrections} corrections");
}

#[test]
fn test_play_without_media_is_rejected() {
    let clock = ManualClock::new();
    let mut c = controller(&clock, &SyncConfig::default(), 1.0);
    assert_eq!(
        c.play(),
        Err(SyncError::NotReady(NotReadyError { missing: StreamRole::Primary }))
    );
    assert_eq!(c.transport(), TransportState::Stopped);
}

#[test]
fn test_overlay_drag_does_not_touch_playback() {
    let clock = ManualClock::new();
    let mut c = loaded(&clock);
    c.play().unwrap();
    c.toggle_overlay();

    let g = c.overlay().geometry();
    let overlay = c.overlay_mut();
    overlay.begin_resize(ResizeHandle::BottomRight, egui::pos2(g.x + g.width, g.y + g.height));
    overlay.resize_to(egui::pos2(5_000.0, 5_000.0));
    overlay.end_gesture();

    let resized = c.overlay().geometry();
    assert_eq!(resized.x + resized.width, 1000.0);
    assert_eq!(resized.y + resized.height, 600.0);

    c.overlay_mut().set_host_size(400.0, 300.0);
    let shrunk = c.overlay().geometry();
    assert!(shrunk.fits(egui::vec2(400.0, 300.0), c.overlay().min_size()));
    assert_eq!(c.transport(), TransportState::Playing);
}

#[test]
fn test_engine_round_trip() {
    let clock = ManualClock::new();
    let mut engine = PlaybackEngine::new(loaded(&clock));
    let tx = engine.sender();
    let responses = engine.responses();

    tx.send(PlaybackCommand::SetVolume {
        role: StreamRole::Secondary,
        level: 0.3,
    })
    .unwrap();
    tx.send(PlaybackCommand::Swap).unwrap();
    tx.send(PlaybackCommand::Seek(from_seconds(42.0))).unwrap();
    tx.send(PlaybackCommand::Shutdown).unwrap();
    tx.send(PlaybackCommand::Play).unwrap();

    assert!(!engine.pump());
    let state = engine.controller().state();
    // Play after shutdown was never applied
    assert_eq!(state.transport, TransportState::Stopped);
    // B was secondary when its volume was set, and is primary now
    assert_eq!(state.primary.handle, StreamHandle::B);
    assert_eq!(state.primary.volume, 0.3);
    assert_eq!(time::to_seconds(state.primary.position), 42.0);

    let changes = responses
        .try_iter()
        .filter(|r| matches!(r, PlaybackResponse::StateChanged(_)))
        .count();
    assert_eq!(changes, 3);
}
