//! Audio playback via `rodio`.
//!
//! [`AudioPlayback`] owns the rodio output stream, which is `!Send` on some
//! platforms, so it only ever lives on the dedicated audio thread
//! ([`audio_thread`](crate::audio_thread)). What leaves that thread is the
//! per-sentence [`Sink`], which is `Send + Sync` and lets the playback
//! worker block on `sleep_until_end` without holding up the audio thread.

use std::sync::Arc;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::error::VoiceError;

/// Output stream plus the sink of the sentence currently playing.
pub struct AudioPlayback {
    /// rodio output stream (must be kept alive).
    _stream: OutputStream,

    /// Handle used to create sinks.
    stream_handle: OutputStreamHandle,

    /// Sink of the current sentence (if any).
    sink: Option<Arc<Sink>>,
}

impl AudioPlayback {
    /// Open the default output device.
    pub fn new() -> Result<Self, VoiceError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
        })
    }

    /// Start playing interleaved samples on a fresh sink, replacing (and
    /// stopping) any previous one. Returns the sink so the caller can wait
    /// for it to drain.
    pub fn start(
        &mut self,
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Arc<Sink>, VoiceError> {
        self.stop();

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;
        sink.append(SamplesBuffer::new(channels, sample_rate, samples));

        let sink = Arc::new(sink);
        self.sink = Some(Arc::clone(&sink));

        tracing::debug!(sample_rate, channels, "Audio playback started");
        Ok(sink)
    }

    /// Stop the current sink immediately. Anyone blocked in
    /// `sleep_until_end` on it returns.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            tracing::debug!("Audio playback stopped");
        }
    }
}
