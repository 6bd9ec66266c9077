//! Dedicated audio output thread: isolates `!Send` audio resources.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. Rather than using
//! `unsafe impl Send/Sync`, it is confined to a single OS thread and driven
//! through [`AudioCommand`]s sent over a channel.
//!
//! [`AudioThreadHandle`] is the `Send + Sync` proxy the rest of the crate
//! holds.

use std::sync::{Arc, mpsc};
use std::thread;

use rodio::Sink;

use crate::error::VoiceError;
use crate::playback::AudioPlayback;

// ── Commands ───────────────────────────────────────────────────────

/// A command sent to the audio thread.
enum AudioCommand {
    /// Start playing samples on a fresh sink and hand the sink back.
    Play {
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        reply: mpsc::Sender<Result<Arc<Sink>, VoiceError>>,
    },

    /// Stop any active playback immediately (fire-and-forget).
    Halt,

    /// Shut down the audio thread, releasing the output stream.
    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the dedicated audio thread.
///
/// All methods take `&self`; `play` blocks only until the audio thread has
/// started the sink, not until it drains.
pub struct AudioThreadHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the audio thread, open the output device on it, and return the
    /// handle. Device errors are propagated back via a one-shot init channel.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("lector-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    /// Start playing samples; returns the sink to wait on.
    pub fn play(
        &self,
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Arc<Sink>, VoiceError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(AudioCommand::Play {
                samples,
                channels,
                sample_rate,
                reply: tx,
            })
            .map_err(|_| VoiceError::AudioThreadDied)?;
        rx.recv().map_err(|_| VoiceError::AudioThreadDied)?
    }

    /// Stop any active playback immediately (fire-and-forget).
    pub fn halt(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Halt);
    }

    // ── Audio thread event loop ────────────────────────────────────

    /// Body of the audio thread. Owns [`AudioPlayback`] for its entire
    /// lifetime.
    fn run(cmd_rx: &mpsc::Receiver<AudioCommand>, init_tx: &mpsc::Sender<Result<(), VoiceError>>) {
        let mut playback = match AudioPlayback::new() {
            Ok(p) => p,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Play {
                    samples,
                    channels,
                    sample_rate,
                    reply,
                } => {
                    let _ = reply.send(playback.start(samples, channels, sample_rate));
                }
                AudioCommand::Halt => playback.stop(),
                AudioCommand::Shutdown => break,
            }
        }

        playback.stop();
        tracing::debug!("Audio thread shutting down");
    }
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
