//! Playback controller: speaks text sentence by sentence.
//!
//! The controller is a state machine driven by a foreground caller and one
//! background worker thread per session:
//!
//! ```text
//!   Idle ──speak──▶ Playing ◀──resume/pause──▶ Paused
//!                      │                          │
//!                      ├── sequence exhausted ──▶ Finished
//!                      ├── stop ────────────────▶ Stopped ◀── stop
//!                      └── synth/sink error ────▶ Failed
//! ```
//!
//! Per sentence the worker: marks the highlight, reads the speed, calls the
//! [`SynthesisAdapter`], plays the artifact on the [`AudioSink`] (blocking),
//! and drops the artifact. The foreground only flips [`SessionSignals`]
//! and asks the sink to halt; it never touches an artifact.
//!
//! Pause during audible playback halts the sink and the rest of that
//! sentence is skipped; on resume the worker continues with the next one.
//! Pause while a sentence is still being synthesized holds that sentence
//! back and plays it in full after resume.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::audio_io::AudioSink;
use crate::backend::SynthesisAdapter;
use crate::error::VoiceError;
use crate::highlight::HighlightSink;
use crate::position::{SentenceUnit, byte_offset, map_positions_from};
use crate::segment::split_sentences;
use crate::settings::Settings;
use crate::signals::{SessionSignals, SpeedFactor};

// ── Playback state machine ─────────────────────────────────────────

/// Lifecycle state of the controller's current (or last) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// No session has run yet.
    #[default]
    Idle,

    /// The worker is iterating sentences.
    Playing,

    /// The worker holds before the next sentence until resumed or stopped.
    Paused,

    /// Every sentence was spoken.
    Finished,

    /// The session was stopped.
    Stopped,

    /// A sentence failed to synthesize or play; the rest was abandoned.
    Failed,
}

impl PlaybackState {
    /// `Finished`, `Stopped` or `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Stopped | Self::Failed)
    }

    /// `Playing` or `Paused`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

// ── Events emitted by the controller ───────────────────────────────

/// Events emitted to the UI / application layer.
///
/// `index` is the sentence's position in the played sequence, except for
/// [`SentenceSkipped`](Self::SentenceSkipped) where it is the position in
/// the segmented sequence (the skipped sentence has no played position).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum PlaybackEvent {
    /// Controller state changed.
    StateChanged(PlaybackState),

    /// A sentence is highlighted and about to be synthesized.
    SentenceStarted {
        index: usize,
        start_offset: usize,
        end_offset: usize,
        text: String,
    },

    /// A sentence could not be located in the source text and is not spoken.
    SentenceSkipped { index: usize, text: String },

    /// A sentence finished playing (or was cut short by a pause).
    SentenceFinished { index: usize },

    /// The speed factor changed.
    SpeedChanged(f32),

    /// The session failed on this sentence.
    Failed {
        index: usize,
        text: String,
        error: String,
    },
}

// ── Controller configuration ───────────────────────────────────────

/// Configuration for the playback controller.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackConfig {
    /// Upper bound on how long a paused worker goes without re-checking
    /// its signals.
    pub poll_interval: Duration,

    /// Speed factor before any `set_speed` call.
    pub initial_speed: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            initial_speed: 1.0,
        }
    }
}

impl From<&Settings> for PlaybackConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.effective_poll_interval(),
            initial_speed: settings.effective_speed(),
        }
    }
}

// ── Shared state ───────────────────────────────────────────────────

/// State owned jointly by the controller and its worker.
struct Shared {
    synth: Arc<dyn SynthesisAdapter>,
    audio: Arc<dyn AudioSink>,
    highlight: Arc<dyn HighlightSink>,
    speed: SpeedFactor,
    poll_interval: Duration,
    status: Mutex<Status>,
    status_changed: Condvar,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
}

#[derive(Default)]
struct Status {
    state: PlaybackState,
    failure: Option<VoiceError>,
}

impl Shared {
    fn lock_status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&self, status: &mut Status, new_state: PlaybackState) {
        if status.state != new_state {
            tracing::debug!(old = ?status.state, new = ?new_state, "Playback state transition");
            status.state = new_state;
            self.emit(PlaybackEvent::StateChanged(new_state));
            self.status_changed.notify_all();
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Playback event receiver dropped");
        }
    }
}

/// The session currently owned by the controller.
struct ActiveSession {
    signals: Arc<SessionSignals>,
    worker: thread::JoinHandle<()>,
}

// ── Playback controller ────────────────────────────────────────────

/// Speaks text sentence by sentence with pause/resume/stop and highlighting.
///
/// All methods take `&self` and never block on playback, so the controller
/// can be shared (`Arc<PlaybackController>`) between the tasks of a
/// foreground actor. At most one session (and one worker thread) exists at
/// a time; [`speak`](Self::speak) while one is active is rejected with
/// [`VoiceError::AlreadyActive`].
pub struct PlaybackController {
    shared: Arc<Shared>,
    session: Mutex<Option<ActiveSession>>,
    /// Serializes `speak` calls. Held while a stopping worker is joined, so
    /// the `session` lock never is.
    starting: Mutex<()>,
}

impl PlaybackController {
    /// Create a controller.
    ///
    /// Returns the controller and a receiver for [`PlaybackEvent`]s.
    #[must_use]
    pub fn new(
        synth: Arc<dyn SynthesisAdapter>,
        audio: Arc<dyn AudioSink>,
        highlight: Arc<dyn HighlightSink>,
        config: PlaybackConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let shared = Shared {
            synth,
            audio,
            highlight,
            speed: SpeedFactor::new(config.initial_speed),
            poll_interval: config.poll_interval,
            status: Mutex::new(Status::default()),
            status_changed: Condvar::new(),
            event_tx,
        };

        let controller = Self {
            shared: Arc::new(shared),
            session: Mutex::new(None),
            starting: Mutex::new(()),
        };

        (controller, event_rx)
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Speak `text` from the beginning.
    pub fn speak(&self, text: &str) -> Result<(), VoiceError> {
        self.speak_from(text, 0)
    }

    /// Speak `text` starting at character `from_offset`.
    ///
    /// Highlight offsets stay relative to the whole `text`. An offset past
    /// the end yields an empty session that finishes immediately.
    pub fn speak_from(&self, text: &str, from_offset: usize) -> Result<(), VoiceError> {
        let tail = &text[byte_offset(text, from_offset)..];
        let sentences = split_sentences(tail.trim());
        self.start_session(text, &sentences, from_offset)
    }

    /// Speak an externally segmented sentence list, mapped onto `text`.
    pub fn speak_segments<S: AsRef<str>>(
        &self,
        text: &str,
        sentences: &[S],
    ) -> Result<(), VoiceError> {
        self.start_session(text, sentences, 0)
    }

    /// Pause the active session and halt any audible sentence.
    ///
    /// Pausing an already paused session is a no-op.
    pub fn pause(&self) -> Result<(), VoiceError> {
        let session = self.lock_session();
        let signals = Self::live_signals(session.as_ref())?;

        {
            let mut status = self.shared.lock_status();
            match status.state {
                PlaybackState::Paused => return Ok(()),
                PlaybackState::Playing => {}
                _ => return Err(VoiceError::NotActive),
            }
            signals.pause();
            self.shared.set_state(&mut status, PlaybackState::Paused);
        }

        self.shared.audio.halt();
        tracing::info!("Playback paused");
        Ok(())
    }

    /// Resume a paused session. Resuming a playing session is a no-op.
    pub fn resume(&self) -> Result<(), VoiceError> {
        let session = self.lock_session();
        let signals = Self::live_signals(session.as_ref())?;

        let mut status = self.shared.lock_status();
        match status.state {
            PlaybackState::Playing => return Ok(()),
            PlaybackState::Paused => {}
            _ => return Err(VoiceError::NotActive),
        }
        signals.resume();
        self.shared.set_state(&mut status, PlaybackState::Playing);
        tracing::info!("Playback resumed");
        Ok(())
    }

    /// Stop the active session. A no-op when nothing is playing.
    ///
    /// Returns immediately; the worker reaches `Stopped` within one poll
    /// interval plus the sink's halt latency.
    pub fn stop(&self) {
        let session = self.lock_session();
        let Some(active) = session.as_ref() else {
            return;
        };
        if active.signals.is_stopped() || active.worker.is_finished() {
            return;
        }

        active.signals.request_stop();
        self.shared.audio.halt();
        tracing::info!("Playback stop requested");
    }

    /// Change the speed factor. Affects sentences synthesized after the call.
    pub fn set_speed(&self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            tracing::warn!(speed, "Ignoring invalid speed factor");
            return;
        }
        self.shared.speed.set(speed);
        self.shared.emit(PlaybackEvent::SpeedChanged(speed));
        tracing::debug!(speed, "Speed factor changed");
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Current speed factor.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.shared.speed.get()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.shared.lock_status().state
    }

    /// Take the error that ended the last `Failed` session, if any.
    ///
    /// The error is a [`VoiceError::SentenceFailed`] carrying the failing
    /// sentence's index and text.
    pub fn take_failure(&self) -> Option<VoiceError> {
        self.shared.lock_status().failure.take()
    }

    /// Block until the session leaves `Playing`/`Paused`, or `timeout`
    /// elapses. Returns the state reached, or `None` on timeout.
    #[must_use]
    pub fn wait_for_terminal(&self, timeout: Duration) -> Option<PlaybackState> {
        let deadline = Instant::now() + timeout;
        let mut status = self.shared.lock_status();
        while status.state.is_active() {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            status = self
                .shared
                .status_changed
                .wait_timeout(status, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Some(status.state)
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn lock_session(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signals of a session that is still running and not being stopped.
    fn live_signals(session: Option<&ActiveSession>) -> Result<&SessionSignals, VoiceError> {
        match session {
            Some(active) if !active.signals.is_stopped() && !active.worker.is_finished() => {
                Ok(active.signals.as_ref())
            }
            _ => Err(VoiceError::NotActive),
        }
    }

    fn start_session<S: AsRef<str>>(
        &self,
        text: &str,
        sentences: &[S],
        from_offset: usize,
    ) -> Result<(), VoiceError> {
        let _starting = self.starting.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = {
            let mut session = self.lock_session();
            if let Some(active) = session.as_ref() {
                if !active.signals.is_stopped() && self.state().is_active() {
                    return Err(VoiceError::AlreadyActive);
                }
            }
            session.take()
        };
        // Joined outside the session lock: stop/pause/resume must not wait
        // for a stopping worker that is still inside `synthesize`.
        if let Some(previous) = previous {
            join_worker(previous.worker);
        }

        let map = map_positions_from(text, sentences, from_offset);
        for skipped in map.skipped {
            self.shared.emit(PlaybackEvent::SentenceSkipped {
                index: skipped.index,
                text: skipped.text,
            });
        }

        let mut session = self.lock_session();
        let mut status = self.shared.lock_status();
        status.failure = None;

        if map.units.is_empty() {
            tracing::info!("Nothing to speak");
            self.shared.set_state(&mut status, PlaybackState::Finished);
            return Ok(());
        }

        tracing::info!(
            sentences = map.units.len(),
            from_offset,
            speed = self.speed(),
            "Starting playback session"
        );
        self.shared.set_state(&mut status, PlaybackState::Playing);
        drop(status);

        let signals = Arc::new(SessionSignals::new());
        let worker = {
            let shared = Arc::clone(&self.shared);
            let signals = Arc::clone(&signals);
            let units = map.units;
            thread::Builder::new()
                .name("lector-playback".into())
                .spawn(move || run_session(&shared, &signals, &units))
        };

        match worker {
            Ok(worker) => {
                *session = Some(ActiveSession { signals, worker });
                Ok(())
            }
            Err(e) => {
                let mut status = self.shared.lock_status();
                self.shared.set_state(&mut status, PlaybackState::Failed);
                Err(VoiceError::Io(e))
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
        if let Some(active) = self.lock_session().take() {
            join_worker(active.worker);
        }
    }
}

fn join_worker(worker: thread::JoinHandle<()>) {
    if worker.join().is_err() {
        tracing::error!("Playback worker panicked");
    }
}

// ── Worker ─────────────────────────────────────────────────────────

/// How a session ended.
enum Outcome {
    Finished,
    Stopped,
    Failed(VoiceError),
}

/// Runs on every exit from the worker, including unwinding: clears the
/// highlight exactly once and publishes the terminal state.
struct SessionGuard<'a> {
    shared: &'a Shared,
    outcome: Option<Outcome>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.shared.highlight.clear();

        let terminal = match self.outcome.take() {
            Some(Outcome::Finished) => PlaybackState::Finished,
            Some(Outcome::Stopped) => PlaybackState::Stopped,
            Some(Outcome::Failed(error)) => {
                if let VoiceError::SentenceFailed { index, text, source } = &error {
                    self.shared.emit(PlaybackEvent::Failed {
                        index: *index,
                        text: text.clone(),
                        error: source.to_string(),
                    });
                }
                tracing::error!(error = %error, "Playback session failed");
                self.shared.lock_status().failure = Some(error);
                PlaybackState::Failed
            }
            None => {
                tracing::error!("Playback worker exited abnormally");
                PlaybackState::Failed
            }
        };

        let mut status = self.shared.lock_status();
        self.shared.set_state(&mut status, terminal);
        drop(status);
        tracing::info!(state = ?terminal, "Playback session ended");
    }
}

fn run_session(shared: &Shared, signals: &SessionSignals, units: &[SentenceUnit]) {
    let mut guard = SessionGuard {
        shared,
        outcome: None,
    };
    guard.outcome = Some(match play_units(shared, signals, units) {
        Ok(outcome) => outcome,
        Err(e) => Outcome::Failed(e),
    });
}

fn play_units(
    shared: &Shared,
    signals: &SessionSignals,
    units: &[SentenceUnit],
) -> Result<Outcome, VoiceError> {
    let interrupted = || signals.is_stopped() || signals.is_paused();

    for (index, unit) in units.iter().enumerate() {
        if !signals.wait_while_paused(shared.poll_interval) {
            return Ok(Outcome::Stopped);
        }

        shared.highlight.mark(unit.start_offset, unit.end_offset);
        shared.emit(PlaybackEvent::SentenceStarted {
            index,
            start_offset: unit.start_offset,
            end_offset: unit.end_offset,
            text: unit.text.clone(),
        });

        let speed = shared.speed.get();
        tracing::debug!(index, speed, "Synthesizing sentence");

        let artifact = match shared.synth.synthesize(unit.text.trim(), speed) {
            Ok(artifact) => artifact,
            Err(_) if signals.is_stopped() => return Ok(Outcome::Stopped),
            Err(e) => return Err(VoiceError::sentence_failed(index, &unit.text, e)),
        };

        // A pause that arrived during synthesis holds this sentence back.
        if !signals.wait_while_paused(shared.poll_interval) {
            return Ok(Outcome::Stopped);
        }

        let played = shared.audio.play(&artifact, &interrupted);
        drop(artifact);

        match played {
            Ok(()) => {}
            Err(_) if signals.is_stopped() => return Ok(Outcome::Stopped),
            Err(e) => return Err(VoiceError::sentence_failed(index, &unit.text, e)),
        }

        if signals.is_stopped() {
            return Ok(Outcome::Stopped);
        }
        shared.emit(PlaybackEvent::SentenceFinished { index });
    }

    Ok(Outcome::Finished)
}
