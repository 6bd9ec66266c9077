//! Speech synthesis backends.
//!
//! The [`PlaybackController`](crate::controller::PlaybackController) only
//! sees the [`SynthesisAdapter`] trait (`Arc<dyn SynthesisAdapter>`), so
//! engines can be swapped without touching the playback logic.
//!
//! | Feature    | Module             | Engine |
//! |------------|--------------------|--------|
//! | (always)   | [`command`]        | external program, `espeak-ng` by default |
//! | `sherpa`   | [`sherpa_tts`]     | local Kokoro model via sherpa-onnx |

pub mod command;
#[cfg(feature = "sherpa")]
pub mod sherpa_tts;

use crate::artifact::AudioArtifact;
use crate::error::VoiceError;

/// Converts one sentence into audio.
///
/// Called only from the playback worker thread, one sentence at a time.
/// Implementations must not keep per-call state that changes the result of
/// later calls.
pub trait SynthesisAdapter: Send + Sync {
    /// Synthesize `text` at `speed` (1.0 = normal rate).
    fn synthesize(&self, text: &str, speed: f32) -> Result<AudioArtifact, VoiceError>;
}
