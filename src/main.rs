//! Headless shell.
//!
//! Loads the configuration, starts the media engine and drives the playback
//! engine from line commands on stdin. State changes are printed to stdout,
//! logs go to stderr.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam::channel;
use tracing::{error, info};

use reaction_sync::core::clock::{Clock, SystemClock};
use reaction_sync::core::time::{self, format_time};
use reaction_sync::logging::init_tracing;
use reaction_sync::media::{init_engine, FfmpegProbe, Probe};
use reaction_sync::playback::{PlaybackCommand, PlaybackEngine, PlaybackResponse, StreamRole, SyncController, SyncState};
use reaction_sync::SyncConfig;

const HELP: &str = "\
commands:
  play | pause | toggle
  seek SECS              seek the primary, secondary follows at the offset
  offset SECS            secondary = primary + offset
  vol primary|secondary LEVEL
  swap                   exchange primary and secondary
  overlay                show or hide the overlay
  load primary|secondary PATH
  state | help | quit";

/// Keep a secondary video locked to a primary one at an offset
#[derive(Debug, Parser)]
#[command(name = "reaction-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Media for the primary stream
    primary: Option<PathBuf>,

    /// Media for the secondary stream
    secondary: Option<PathBuf>,
}

fn parse_role(word: Option<&str>) -> Result<StreamRole, String> {
    match word {
        Some("primary" | "p") => Ok(StreamRole::Primary),
        Some("secondary" | "s") => Ok(StreamRole::Secondary),
        _ => Err("expected primary or secondary".to_string()),
    }
}

fn parse_seconds(word: Option<&str>) -> Result<time::Time, String> {
    let word = word.ok_or("expected a number of seconds")?;
    let secs: f64 = word.parse().map_err(|_| format!("not a number: {word}"))?;
    if !secs.is_finite() {
        return Err(format!("not a finite number: {word}"));
    }
    Ok(time::from_seconds(secs))
}

/// Parse one shell line. Blank lines give `Ok(None)`.
fn parse_command(line: &str) -> Result<Option<PlaybackCommand>, String> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb {
        "play" => PlaybackCommand::Play,
        "pause" => PlaybackCommand::Pause,
        "toggle" => PlaybackCommand::TogglePlay,
        "seek" => PlaybackCommand::Seek(parse_seconds(words.next())?),
        "offset" => PlaybackCommand::SetOffset(parse_seconds(words.next())?),
        "vol" | "volume" => {
            let role = parse_role(words.next())?;
            let word = words.next().ok_or("expected a volume level")?;
            let level = word.parse().map_err(|_| format!("not a number: {word}"))?;
            PlaybackCommand::SetVolume { role, level }
        }
        "swap" => PlaybackCommand::Swap,
        "overlay" => PlaybackCommand::ToggleOverlay,
        "load" => {
            let role = parse_role(words.next())?;
            // Paths may contain spaces, so take the rest of the line
            let rest = line[verb.len()..].trim_start();
            let path = rest.split_once(char::is_whitespace).map(|(_, p)| p.trim()).unwrap_or("");
            if path.is_empty() {
                return Err("expected a path".to_string());
            }
            PlaybackCommand::Load {
                role,
                path: PathBuf::from(path),
            }
        }
        "state" => PlaybackCommand::Report,
        "quit" | "exit" => PlaybackCommand::Shutdown,
        other => return Err(format!("unknown command {other}, try help")),
    };
    Ok(Some(command))
}

fn describe(state: &SyncState) -> String {
    let name = |media: &Option<reaction_sync::media::MediaInfo>| {
        media
            .as_ref()
            .map_or_else(|| "-".to_string(), |m| m.path.display().to_string())
    };
    format!(
        "{} primary[{}] {} / {} vol {:.2} | secondary[{}] {} / {} vol {:.2} | offset {} | overlay {}",
        state.transport,
        name(&state.primary.media),
        format_time(state.primary.position),
        format_time(state.primary.duration),
        state.primary.volume,
        name(&state.secondary.media),
        format_time(state.secondary.position),
        format_time(state.secondary.duration),
        state.secondary.volume,
        format_time(state.offset),
        if state.overlay.visible { "shown" } else { "hidden" },
    )
}

fn spawn_input(commands: channel::Sender<PlaybackCommand>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("stdin".into()).spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim() == "help" {
                println!("{HELP}");
                continue;
            }
            match parse_command(&line) {
                Ok(Some(command)) => {
                    let shutdown = command == PlaybackCommand::Shutdown;
                    if commands.send(command).is_err() || shutdown {
                        return;
                    }
                }
                Ok(None) => {}
                Err(msg) => eprintln!("{msg}"),
            }
        }
        // End of input ends the session
        let _ = commands.send(PlaybackCommand::Shutdown);
    })
}

fn spawn_output(responses: channel::Receiver<PlaybackResponse>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("stdout".into()).spawn(move || {
        for response in responses {
            match response {
                PlaybackResponse::StateChanged(state) => println!("{}", describe(&state)),
                PlaybackResponse::DriftCorrected { error, target } => {
                    println!("drift {} ms, secondary -> {}", time::to_millis(error), format_time(target))
                }
                PlaybackResponse::Error(err) => eprintln!("error: {err}"),
                PlaybackResponse::Stopped => break,
            }
        }
    })
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match SyncConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level);

    if let Err(err) = init_engine() {
        error!(error = %err, "cannot start");
        return ExitCode::FAILURE;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let probe: Arc<dyn Probe> = Arc::new(FfmpegProbe::new());
    let mut engine = PlaybackEngine::new(SyncController::headless(&config, clock, probe));
    let commands = engine.sender();

    for (role, path) in [(StreamRole::Primary, args.primary), (StreamRole::Secondary, args.secondary)] {
        if let Some(path) = path {
            // Receiver lives in `engine`, so this cannot fail
            let _ = commands.send(PlaybackCommand::Load { role, path });
        }
    }

    let output = match spawn_output(engine.responses()) {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "cannot start output thread");
            return ExitCode::FAILURE;
        }
    };
    // Not joined: it may be parked on a stdin read
    if let Err(err) = spawn_input(commands) {
        error!(error = %err, "cannot start input thread");
        return ExitCode::FAILURE;
    }

    info!("type help for commands");
    engine.run(config.tick_interval());
    let _ = output.join();
    ExitCode::SUCCESS
}
