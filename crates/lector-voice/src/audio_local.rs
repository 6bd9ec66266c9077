//! Local (rodio) adapter for the [`AudioSink`] trait.
//!
//! [`LocalAudioSink`] wraps an [`AudioThreadHandle`]. `play` asks the audio
//! thread to start a sink and then blocks the *calling* thread on
//! `Sink::sleep_until_end`, so the audio thread stays free to process a
//! concurrent [`halt`](AudioSink::halt).
//!
//! A halt can race the start of a play (halt processed before the new sink
//! exists). Every halt bumps an epoch counter; `play` compares the epoch it
//! saw before starting with the one after, and stops the fresh sink itself
//! when they differ or when the caller's `interrupted` check fires.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::artifact::AudioArtifact;
use crate::audio_io::AudioSink;
use crate::audio_thread::AudioThreadHandle;
use crate::error::VoiceError;

/// Local audio output adapter, delegates to rodio via [`AudioThreadHandle`].
pub struct LocalAudioSink {
    handle: AudioThreadHandle,
    halt_epoch: AtomicU64,
}

impl LocalAudioSink {
    /// Spawn the audio thread on the default output device.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError`] if the audio thread fails to start (e.g. no
    /// output device present).
    pub fn new() -> Result<Self, VoiceError> {
        Ok(Self {
            handle: AudioThreadHandle::spawn()?,
            halt_epoch: AtomicU64::new(0),
        })
    }
}

impl AudioSink for LocalAudioSink {
    fn play(
        &self,
        artifact: &AudioArtifact,
        interrupted: &dyn Fn() -> bool,
    ) -> Result<(), VoiceError> {
        if artifact.is_empty() {
            return Ok(());
        }

        let epoch = self.halt_epoch.load(Ordering::SeqCst);
        let sink = self
            .handle
            .play(
                artifact.samples().to_vec(),
                artifact.channels(),
                artifact.sample_rate(),
            )
            .map_err(|e| match e {
                VoiceError::AudioThreadDied => e,
                other => VoiceError::PlaybackError(other.to_string()),
            })?;

        if self.halt_epoch.load(Ordering::SeqCst) != epoch || interrupted() {
            sink.stop();
            tracing::debug!("Playback halted before it started");
            return Ok(());
        }

        sink.sleep_until_end();
        Ok(())
    }

    fn halt(&self) {
        self.halt_epoch.fetch_add(1, Ordering::SeqCst);
        self.handle.halt();
    }
}
