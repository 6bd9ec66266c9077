//! Speak command handler.
//!
//! Runs the foreground side of a read-aloud session: forwards control lines
//! typed on stdin to the controller, prints events, and stops on Ctrl-C.

use std::io::BufRead;
use std::sync::Arc;

use console::style;
use lector_voice::settings::{SPEED_STEP, clamp_speed};
use lector_voice::{PlaybackController, PlaybackEvent, PlaybackState, VoiceError};
use tokio::sync::mpsc;

use crate::bootstrap::{CliConfig, build_controller};
use crate::commands::{SourceArgs, SynthArgs};
use crate::error::CliError;
use crate::presentation::TerminalHighlight;
use crate::utils::input::{is_stdin, read_source};

/// A control line typed while speaking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Pause,
    Resume,
    /// Pause when playing, resume when paused (empty line).
    Toggle,
    Stop,
    Faster,
    Slower,
    Speed(f32),
    Quit,
}

impl ControlCommand {
    /// Parse one input line. Returns `None` for anything unrecognised.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim().to_lowercase();
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Some(Self::Toggle);
        };

        let command = match word {
            "p" | "pause" => Self::Pause,
            "r" | "resume" => Self::Resume,
            "s" | "stop" => Self::Stop,
            "q" | "quit" => Self::Quit,
            "+" | "faster" => Self::Faster,
            "-" | "slower" => Self::Slower,
            "speed" => Self::Speed(parts.next()?.parse().ok()?),
            _ => return None,
        };

        parts.next().is_none().then_some(command)
    }
}

/// Speed after applying a speed command to `current`, within the speed
/// control's range.
pub fn next_speed(command: ControlCommand, current: f32) -> Option<f32> {
    match command {
        ControlCommand::Faster => Some(clamp_speed(current + SPEED_STEP)),
        ControlCommand::Slower => Some(clamp_speed(current - SPEED_STEP)),
        ControlCommand::Speed(speed) => Some(clamp_speed(speed)),
        _ => None,
    }
}

/// Execute the speak command.
pub async fn execute(source: &SourceArgs, synth: &SynthArgs) -> Result<(), CliError> {
    let text = read_source(source.file.as_deref())?;
    let config = CliConfig::from_args(synth)?;

    let highlight = Arc::new(TerminalHighlight::new(text.clone(), source.json));
    let (controller, mut events) = build_controller(&config, highlight)?;

    // With the text piped in, stdin is already consumed.
    let mut controls = if is_stdin(source.file.as_deref()) {
        None
    } else {
        if !source.json {
            eprintln!(
                "{}",
                style("Controls: p pause, r resume, s stop, + faster, - slower, speed <x>, q quit")
                    .dim()
            );
        }
        Some(spawn_control_reader())
    };

    controller.speak_from(&text, source.from)?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event, source.json);
                if let PlaybackEvent::StateChanged(state) = event {
                    if state.is_terminal() {
                        break;
                    }
                }
            }
            line = next_control(&mut controls) => {
                match line {
                    Some(line) => apply_control(&controller, &line),
                    None => controls = None,
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                tracing::debug!("Ctrl-C received, stopping playback");
                controller.stop();
            }
        }
    }

    match controller.state() {
        PlaybackState::Failed => {
            let error = controller
                .take_failure()
                .unwrap_or_else(|| VoiceError::PlaybackError("playback failed".to_string()));
            Err(error.into())
        }
        state => {
            tracing::info!(?state, "Session ended");
            Ok(())
        }
    }
}

/// Read stdin lines on a detached thread.
///
/// A blocking read must not hold up runtime shutdown, so this stays off the
/// tokio blocking pool.
fn spawn_control_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("lector-controls".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to start control reader, only Ctrl-C will work");
    }
    rx
}

async fn next_control(controls: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match controls {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn apply_control(controller: &PlaybackController, line: &str) {
    let Some(command) = ControlCommand::parse(line) else {
        eprintln!("{} unknown command: {}", style("?").yellow(), line.trim());
        return;
    };

    let result = match command {
        ControlCommand::Pause => controller.pause(),
        ControlCommand::Resume => controller.resume(),
        ControlCommand::Toggle => match controller.state() {
            PlaybackState::Paused => controller.resume(),
            _ => controller.pause(),
        },
        ControlCommand::Stop | ControlCommand::Quit => {
            controller.stop();
            Ok(())
        }
        ControlCommand::Faster | ControlCommand::Slower | ControlCommand::Speed(_) => {
            if let Some(speed) = next_speed(command, controller.speed()) {
                controller.set_speed(speed);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {e}", style("!").yellow());
    }
}

fn print_event(event: &PlaybackEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode playback event"),
        }
        return;
    }

    match event {
        PlaybackEvent::StateChanged(PlaybackState::Paused) => {
            eprintln!("{}", style("paused").yellow());
        }
        PlaybackEvent::StateChanged(PlaybackState::Stopped) => {
            eprintln!("{}", style("stopped").yellow());
        }
        PlaybackEvent::StateChanged(PlaybackState::Finished) => {
            eprintln!("{}", style("finished").green());
        }
        PlaybackEvent::SentenceSkipped { index, text } => {
            eprintln!(
                "{} sentence #{index} not found in text, skipped: {}",
                style("!").yellow(),
                text.trim()
            );
        }
        PlaybackEvent::SpeedChanged(speed) => {
            eprintln!("{}", style(format!("speed {speed:.1}x")).dim());
        }
        PlaybackEvent::Failed { index, error, .. } => {
            eprintln!("{} sentence #{index} failed: {error}", style("✗").red());
        }
        // Highlight lines are printed by the highlight sink.
        PlaybackEvent::StateChanged(_)
        | PlaybackEvent::SentenceStarted { .. }
        | PlaybackEvent::SentenceFinished { .. } => {}
    }
}
