//! [`AudioSink`] trait abstraction for sentence playback.
//!
//! Decouples the [`PlaybackController`](crate::controller::PlaybackController)
//! from any specific audio backend:
//!
//! | Implementor | Where used |
//! |---|---|
//! | [`LocalAudioSink`](crate::audio_local::LocalAudioSink) | CLI, rodio playback on the local machine |
//! | test doubles | integration tests, no audio hardware |
//!
//! The trait is **object-safe** (`Arc<dyn AudioSink>`). All methods take
//! `&self`; implementations use interior mutability (channels, atomics) so
//! that [`halt`](AudioSink::halt) can run on the foreground thread while the
//! worker is blocked inside [`play`](AudioSink::play).

use crate::artifact::AudioArtifact;
use crate::error::VoiceError;

/// Abstraction over an audio output sink.
pub trait AudioSink: Send + Sync {
    /// Play `artifact` and block until it has drained or was halted.
    ///
    /// `interrupted` is checked once the audio has actually started; when it
    /// returns `true` the sink stops right away. Callers set their
    /// interruption flag *before* calling [`halt`](AudioSink::halt), so an
    /// interruption is either seen by that check or halts a sink that is
    /// already running.
    ///
    /// A halt is not an error: the call returns `Ok(())` early.
    fn play(
        &self,
        artifact: &AudioArtifact,
        interrupted: &dyn Fn() -> bool,
    ) -> Result<(), VoiceError>;

    /// Interrupt the current (or just-starting) [`play`](AudioSink::play)
    /// call promptly. Callable from any thread; a no-op when idle.
    fn halt(&self);
}
