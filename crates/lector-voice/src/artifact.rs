//! Transient synthesized audio for exactly one sentence.
//!
//! An [`AudioArtifact`] is owned by the playback worker for the duration of
//! one sentence iteration. Dropping it releases the sample buffer and, when
//! the synthesizer wrote to disk, deletes the backing temporary file, so
//! cleanup happens on every exit path (normal, interrupted, error, panic).

use std::path::Path;
use std::time::Duration;

use tempfile::TempPath;

/// Synthesized waveform plus its format, optionally backed by a temp file.
#[derive(Debug)]
pub struct AudioArtifact {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    backing: Option<TempPath>,
}

impl AudioArtifact {
    /// In-memory mono artifact.
    #[must_use]
    pub const fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
            backing: None,
        }
    }

    /// Set the interleaved channel count (minimum 1).
    #[must_use]
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels.max(1);
        self
    }

    /// Attach a temporary file that is deleted together with the artifact.
    #[must_use]
    pub fn with_backing_file(mut self, path: TempPath) -> Self {
        self.backing = Some(path);
        self
    }

    /// Interleaved PCM f32 samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Whether there is anything to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Path of the backing temporary file, if any.
    #[must_use]
    pub fn backing_path(&self) -> Option<&Path> {
        self.backing.as_deref()
    }

    /// Playback duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / usize::from(self.channels);
        #[allow(clippy::cast_precision_loss)]
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        let Some(path) = self.backing.take() else {
            return;
        };
        let path_str = path.display().to_string();
        match path.close() {
            Ok(()) => tracing::debug!(path = %path_str, "Removed synthesis artifact"),
            Err(e) => tracing::warn!(path = %path_str, error = %e, "Failed to remove synthesis artifact"),
        }
    }
}
