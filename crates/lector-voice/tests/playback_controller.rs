//! Integration tests for the `PlaybackController` state machine.
//!
//! The controller is driven with mock collaborators: a synthesizer that can
//! be held at a gate, an audio sink that "plays" for a fixed duration unless
//! halted, and a highlight sink that records marks. No audio hardware or
//! speech program is needed.
//!
//! Signals are observed with bounded latency, so tests wait for conditions
//! with a timeout instead of asserting instantaneous transitions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lector_voice::{
    AudioArtifact, AudioSink, HighlightSink, PlaybackConfig, PlaybackController, PlaybackEvent,
    PlaybackState, SynthesisAdapter, VoiceError,
};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

const TEXT: &str = "Hello world. How are you? Fine!";
const TIMEOUT: Duration = Duration::from_secs(5);

// ── Mock collaborators ─────────────────────────────────────────────

/// Records every call and backs each artifact with a real temp file.
struct MockSynth {
    dir: PathBuf,
    calls: Mutex<Vec<(String, f32)>>,
    gate_open: Mutex<bool>,
    gate: Condvar,
    fail_on: Option<&'static str>,
}

impl MockSynth {
    fn release(&self) {
        *self.gate_open.lock().unwrap() = true;
        self.gate.notify_all();
    }

    fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    fn speeds(&self) -> Vec<f32> {
        self.calls.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SynthesisAdapter for MockSynth {
    fn synthesize(&self, text: &str, speed: f32) -> Result<AudioArtifact, VoiceError> {
        self.calls.lock().unwrap().push((text.to_string(), speed));

        let open = self.gate_open.lock().unwrap();
        let _open = self
            .gate
            .wait_timeout_while(open, TIMEOUT, |open| !*open)
            .unwrap();

        if self.fail_on == Some(text) {
            return Err(VoiceError::SynthesisError("voice exploded".to_string()));
        }

        let file = tempfile::NamedTempFile::new_in(&self.dir)?;
        Ok(AudioArtifact::from_samples(vec![0.0; 160], 16_000)
            .with_backing_file(file.into_temp_path()))
    }
}

#[derive(Default)]
struct SinkLog {
    epoch: u64,
    started: usize,
    completed: usize,
    interrupted: usize,
}

/// Blocks for `play_for` per artifact unless halted.
struct MockSink {
    play_for: Duration,
    fail: bool,
    log: Mutex<SinkLog>,
    halted: Condvar,
}

impl MockSink {
    fn started(&self) -> usize {
        self.log.lock().unwrap().started
    }

    fn completed(&self) -> usize {
        self.log.lock().unwrap().completed
    }

    fn interrupted(&self) -> usize {
        self.log.lock().unwrap().interrupted
    }
}

impl AudioSink for MockSink {
    fn play(
        &self,
        artifact: &AudioArtifact,
        interrupted: &dyn Fn() -> bool,
    ) -> Result<(), VoiceError> {
        assert!(
            artifact.backing_path().is_some_and(|p| p.exists()),
            "artifact must be alive while playing"
        );

        let mut log = self.log.lock().unwrap();
        log.started += 1;
        if self.fail {
            return Err(VoiceError::PlaybackError("device unplugged".to_string()));
        }

        let epoch = log.epoch;
        if interrupted() {
            log.interrupted += 1;
            return Ok(());
        }

        let deadline = Instant::now() + self.play_for;
        loop {
            if log.epoch != epoch {
                log.interrupted += 1;
                return Ok(());
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                log.completed += 1;
                return Ok(());
            };
            log = self.halted.wait_timeout(log, remaining).unwrap().0;
        }
    }

    fn halt(&self) {
        self.log.lock().unwrap().epoch += 1;
        self.halted.notify_all();
    }
}

#[derive(Default)]
struct MockHighlight {
    marks: Mutex<Vec<(usize, usize)>>,
    clears: AtomicUsize,
}

impl MockHighlight {
    fn marks(&self) -> Vec<(usize, usize)> {
        self.marks.lock().unwrap().clone()
    }

    fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl HighlightSink for MockHighlight {
    fn mark(&self, start: usize, end: usize) {
        self.marks.lock().unwrap().push((start, end));
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Harness ────────────────────────────────────────────────────────

struct Options {
    gated: bool,
    fail_on: Option<&'static str>,
    play_for: Duration,
    fail_play: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gated: false,
            fail_on: None,
            play_for: Duration::from_millis(10),
            fail_play: false,
        }
    }
}

struct Harness {
    controller: PlaybackController,
    events: UnboundedReceiver<PlaybackEvent>,
    synth: Arc<MockSynth>,
    sink: Arc<MockSink>,
    highlight: Arc<MockHighlight>,
    dir: TempDir,
}

impl Harness {
    fn new(options: Options) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let synth = Arc::new(MockSynth {
            dir: dir.path().to_path_buf(),
            calls: Mutex::new(Vec::new()),
            gate_open: Mutex::new(!options.gated),
            gate: Condvar::new(),
            fail_on: options.fail_on,
        });
        let sink = Arc::new(MockSink {
            play_for: options.play_for,
            fail: options.fail_play,
            log: Mutex::new(SinkLog::default()),
            halted: Condvar::new(),
        });
        let highlight = Arc::new(MockHighlight::default());

        let config = PlaybackConfig {
            poll_interval: Duration::from_millis(20),
            initial_speed: 1.0,
        };
        let (controller, events) = PlaybackController::new(
            Arc::clone(&synth) as Arc<dyn SynthesisAdapter>,
            Arc::clone(&sink) as Arc<dyn AudioSink>,
            Arc::clone(&highlight) as Arc<dyn HighlightSink>,
            config,
        );

        Self {
            controller,
            events,
            synth,
            sink,
            highlight,
            dir,
        }
    }

    fn finish(&self) -> PlaybackState {
        self.controller
            .wait_for_terminal(TIMEOUT)
            .expect("session did not reach a terminal state")
    }

    fn artifacts_left(&self) -> usize {
        std::fs::read_dir(self.dir.path()).unwrap().count()
    }

    /// Drain all pending events.
    fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(e) = self.events.try_recv() {
            events.push(e);
        }
        events
    }
}

/// Collect only the state values from StateChanged events.
fn states_from(events: &[PlaybackEvent]) -> Vec<PlaybackState> {
    events
        .iter()
        .filter_map(|e| {
            if let PlaybackEvent::StateChanged(s) = e {
                Some(*s)
            } else {
                None
            }
        })
        .collect()
}

fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[test]
fn speaks_every_sentence_in_order() {
    let mut h = Harness::new(Options::default());

    h.controller.speak(TEXT).unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert_eq!(h.synth.texts(), vec!["Hello world.", "How are you?", "Fine!"]);
    assert_eq!(h.highlight.marks(), vec![(0, 12), (13, 25), (26, 31)]);
    assert_eq!(h.highlight.clears(), 1);
    assert_eq!(h.sink.completed(), 3);
    assert_eq!(h.artifacts_left(), 0);

    let events = h.drain_events();
    assert_eq!(
        states_from(&events),
        vec![PlaybackState::Playing, PlaybackState::Finished]
    );
    assert!(events.contains(&PlaybackEvent::SentenceStarted {
        index: 1,
        start_offset: 13,
        end_offset: 25,
        text: "How are you?".to_string(),
    }));
    assert!(events.contains(&PlaybackEvent::SentenceFinished { index: 2 }));
}

#[test]
fn stop_during_first_synthesis_plays_nothing() {
    let h = Harness::new(Options {
        gated: true,
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    wait_for("first synthesis call", || h.synth.call_count() == 1);

    h.controller.stop();
    h.synth.release();

    assert_eq!(h.finish(), PlaybackState::Stopped);
    assert_eq!(h.sink.started(), 0);
    assert_eq!(h.synth.call_count(), 1);
    assert_eq!(h.artifacts_left(), 0);
    assert_eq!(h.highlight.clears(), 1);
}

#[test]
fn pause_during_second_sentence_skips_its_remainder() {
    let h = Harness::new(Options {
        play_for: Duration::from_millis(300),
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    wait_for("second sentence to start playing", || h.sink.started() == 2);

    h.controller.pause().unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    wait_for("second sentence to be halted", || h.sink.interrupted() == 1);

    // Nothing advances while paused.
    thread::sleep(Duration::from_millis(150));
    assert_eq!(h.sink.started(), 2);
    assert_eq!(h.synth.call_count(), 2);

    h.controller.resume().unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert_eq!(h.synth.texts(), vec!["Hello world.", "How are you?", "Fine!"]);
    assert_eq!(h.sink.started(), 3, "sentence 2 must not be replayed");
    assert_eq!(h.sink.completed(), 2);
    assert_eq!(h.sink.interrupted(), 1);
    assert_eq!(h.artifacts_left(), 0);
}

#[test]
fn speed_change_applies_from_next_sentence() {
    let mut h = Harness::new(Options {
        gated: true,
        ..Default::default()
    });

    h.controller.speak("One. Two.").unwrap();
    wait_for("first synthesis call", || h.synth.call_count() == 1);

    h.controller.set_speed(2.0);
    h.synth.release();

    assert_eq!(h.finish(), PlaybackState::Finished);
    assert_eq!(h.synth.speeds(), vec![1.0, 2.0]);
    assert!((h.controller.speed() - 2.0).abs() < f32::EPSILON);
    assert!(h.drain_events().contains(&PlaybackEvent::SpeedChanged(2.0)));
}

#[test]
fn sentence_missing_from_source_is_skipped() {
    let mut h = Harness::new(Options::default());

    let sentences = ["Hello world.", "Not in the text.", "Fine!"];
    h.controller.speak_segments(TEXT, &sentences).unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert_eq!(h.synth.texts(), vec!["Hello world.", "Fine!"]);
    assert_eq!(h.sink.completed(), 2);
    assert!(h.drain_events().contains(&PlaybackEvent::SentenceSkipped {
        index: 1,
        text: "Not in the text.".to_string(),
    }));
}

#[test]
fn synthesis_failure_aborts_with_sentence_details() {
    let mut h = Harness::new(Options {
        fail_on: Some("How are you?"),
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    assert_eq!(h.finish(), PlaybackState::Failed);

    // No retry, no skipping ahead.
    assert_eq!(h.synth.texts(), vec!["Hello world.", "How are you?"]);
    assert_eq!(h.sink.started(), 1);
    assert_eq!(h.highlight.clears(), 1);
    assert_eq!(h.artifacts_left(), 0);

    match h.controller.take_failure() {
        Some(VoiceError::SentenceFailed { index, text, source }) => {
            assert_eq!(index, 1);
            assert_eq!(text, "How are you?");
            assert!(matches!(*source, VoiceError::SynthesisError(_)));
        }
        other => panic!("expected SentenceFailed, got {other:?}"),
    }
    assert!(h.controller.take_failure().is_none());

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::Failed { index: 1, text, .. } if text == "How are you?"
    )));
    assert_eq!(states_from(&events).last(), Some(&PlaybackState::Failed));
}

#[test]
fn playback_failure_aborts_session() {
    let h = Harness::new(Options {
        fail_play: true,
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    assert_eq!(h.finish(), PlaybackState::Failed);

    assert_eq!(h.synth.call_count(), 1);
    assert_eq!(h.artifacts_left(), 0);
    assert!(matches!(
        h.controller.take_failure(),
        Some(VoiceError::SentenceFailed { index: 0, .. })
    ));
}

#[test]
fn stop_twice_is_same_as_once() {
    let h = Harness::new(Options {
        play_for: Duration::from_secs(2),
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    wait_for("first sentence to start playing", || h.sink.started() == 1);

    h.controller.stop();
    h.controller.stop();
    assert_eq!(h.finish(), PlaybackState::Stopped);
    h.controller.stop();

    assert_eq!(h.controller.state(), PlaybackState::Stopped);
    assert_eq!(h.highlight.clears(), 1);
    assert_eq!(h.sink.interrupted(), 1);
    assert_eq!(h.sink.started(), 1);
}

#[test]
fn pause_then_stop_ends_stopped() {
    let h = Harness::new(Options {
        play_for: Duration::from_secs(2),
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    wait_for("first sentence to start playing", || h.sink.started() == 1);

    h.controller.pause().unwrap();
    h.controller.stop();

    assert_eq!(h.finish(), PlaybackState::Stopped);
    assert_eq!(h.sink.started(), 1);
    assert_eq!(h.artifacts_left(), 0);
}

#[test]
fn pause_during_synthesis_plays_that_sentence_in_full() {
    let h = Harness::new(Options {
        gated: true,
        ..Default::default()
    });

    h.controller.speak("Only one.").unwrap();
    wait_for("synthesis call", || h.synth.call_count() == 1);

    h.controller.pause().unwrap();
    h.synth.release();

    thread::sleep(Duration::from_millis(150));
    assert_eq!(h.sink.started(), 0, "paused worker must not start playback");
    assert_eq!(h.controller.state(), PlaybackState::Paused);

    h.controller.resume().unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);
    assert_eq!(h.sink.completed(), 1);
    assert_eq!(h.sink.interrupted(), 0);
}

#[test]
fn speak_while_active_is_rejected_until_stopped() {
    let h = Harness::new(Options {
        play_for: Duration::from_millis(200),
        ..Default::default()
    });

    h.controller.speak("One. Two.").unwrap();
    wait_for("first sentence to start playing", || h.sink.started() == 1);

    assert!(matches!(
        h.controller.speak("Other. Text."),
        Err(VoiceError::AlreadyActive)
    ));

    h.controller.stop();
    h.controller.speak("Third.").unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert_eq!(h.synth.texts().last().map(String::as_str), Some("Third."));
    assert_eq!(h.highlight.clears(), 2);
    assert_eq!(h.artifacts_left(), 0);
}

#[test]
fn commands_stay_responsive_while_speak_joins_stopping_worker() {
    let h = Harness::new(Options {
        gated: true,
        ..Default::default()
    });

    h.controller.speak(TEXT).unwrap();
    wait_for("first synthesis to start", || h.synth.call_count() == 1);
    h.controller.stop();

    thread::scope(|scope| {
        let speaker = scope.spawn(|| h.controller.speak(TEXT));
        thread::sleep(Duration::from_millis(50));
        assert!(!speaker.is_finished(), "speak returned before the old worker ended");

        // The old worker is still held inside `synthesize`.
        let started = Instant::now();
        h.controller.stop();
        assert!(matches!(h.controller.pause(), Err(VoiceError::NotActive)));
        assert!(matches!(h.controller.resume(), Err(VoiceError::NotActive)));
        assert!(
            started.elapsed() < Duration::from_millis(100),
            "commands blocked for {:?}",
            started.elapsed()
        );
        assert!(!speaker.is_finished());

        h.synth.release();
        speaker.join().unwrap().unwrap();
    });

    assert_eq!(h.finish(), PlaybackState::Finished);
    assert_eq!(h.sink.completed(), 3);
    assert_eq!(h.artifacts_left(), 0);
}

#[test]
fn new_session_after_stop_is_not_stopped() {
    let h = Harness::new(Options::default());

    h.controller.speak("One.").unwrap();
    h.controller.stop();
    h.finish();

    h.controller.speak(TEXT).unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);
    assert_eq!(h.sink.completed() + h.sink.interrupted(), h.sink.started());
    assert!(h.synth.texts().ends_with(&[
        "Hello world.".to_string(),
        "How are you?".to_string(),
        "Fine!".to_string()
    ]));
}

#[test]
fn blank_text_finishes_without_worker() {
    let mut h = Harness::new(Options::default());

    h.controller.speak("  \n\t ").unwrap();

    assert_eq!(h.controller.state(), PlaybackState::Finished);
    assert_eq!(h.synth.call_count(), 0);
    assert!(h.highlight.marks().is_empty());
    assert_eq!(h.highlight.clears(), 0);
    assert_eq!(states_from(&h.drain_events()), vec![PlaybackState::Finished]);
}

#[test]
fn commands_without_session() {
    let h = Harness::new(Options::default());

    assert!(matches!(h.controller.pause(), Err(VoiceError::NotActive)));
    assert!(matches!(h.controller.resume(), Err(VoiceError::NotActive)));
    h.controller.stop();

    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(h.controller.take_failure().is_none());
}

#[test]
fn pause_after_finish_is_not_active() {
    let h = Harness::new(Options::default());

    h.controller.speak("Done.").unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert!(matches!(h.controller.pause(), Err(VoiceError::NotActive)));
    assert_eq!(h.controller.state(), PlaybackState::Finished);
}

#[test]
fn speak_from_cursor_keeps_full_text_offsets() {
    let h = Harness::new(Options::default());

    h.controller.speak_from(TEXT, 13).unwrap();
    assert_eq!(h.finish(), PlaybackState::Finished);

    assert_eq!(h.synth.texts(), vec!["How are you?", "Fine!"]);
    assert_eq!(h.highlight.marks(), vec![(13, 25), (26, 31)]);
}

#[test]
fn speak_from_past_end_is_empty() {
    let h = Harness::new(Options::default());

    h.controller.speak_from(TEXT, 500).unwrap();
    assert_eq!(h.controller.state(), PlaybackState::Finished);
    assert_eq!(h.synth.call_count(), 0);
}

#[test]
fn dropping_controller_stops_session() {
    let Harness {
        controller,
        sink,
        highlight,
        dir,
        ..
    } = Harness::new(Options {
        play_for: Duration::from_secs(5),
        ..Default::default()
    });

    controller.speak(TEXT).unwrap();
    wait_for("first sentence to start playing", || sink.started() == 1);

    let started = Instant::now();
    drop(controller);

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(sink.interrupted(), 1);
    assert_eq!(highlight.clears(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
