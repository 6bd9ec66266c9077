//! Sherpa-ONNX Kokoro backend: implements [`SynthesisAdapter`] via `sherpa-rs`.
//!
//! `KokoroTts::create` takes `&mut self` while the adapter trait uses
//! `&self`, so the engine sits behind a [`Mutex`]. The playback worker is a
//! plain OS thread, so inference runs inline on it.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use sherpa_rs::tts::{KokoroTts, KokoroTtsConfig};

use crate::artifact::AudioArtifact;
use crate::backend::SynthesisAdapter;
use crate::error::VoiceError;

/// Sherpa-ONNX Kokoro sample rate (24 kHz).
pub const SHERPA_TTS_SAMPLE_RATE: u32 = 24_000;

/// Configuration for the Sherpa Kokoro backend.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SherpaTtsConfig {
    /// Voice identifier (e.g., `"af_sarah"`).
    pub voice: String,
}

impl Default for SherpaTtsConfig {
    fn default() -> Self {
        Self {
            voice: "af_sarah".to_string(),
        }
    }
}

/// Local Kokoro synthesizer.
pub struct SherpaSynthesizer {
    engine: Mutex<KokoroTts>,
    voice_id: String,
    speaker_id: i32,
}

impl SherpaSynthesizer {
    /// Load the Kokoro model from a directory.
    ///
    /// The directory must contain `model.onnx`, `voices.bin`, `tokens.txt`
    /// and the `espeak-ng-data/` directory.
    pub fn load(model_dir: &Path, config: &SherpaTtsConfig) -> Result<Self, VoiceError> {
        if !model_dir.exists() {
            return Err(VoiceError::ModelNotFound(model_dir.to_path_buf()));
        }

        let model_path = model_dir.join("model.onnx");
        let voices_path = model_dir.join("voices.bin");
        let tokens_path = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        for path in [&model_path, &voices_path, &tokens_path, &data_dir] {
            if !path.exists() {
                return Err(VoiceError::ModelNotFound(path.clone()));
            }
        }

        tracing::info!(
            dir = %model_dir.display(),
            voice = %config.voice,
            "Loading Sherpa Kokoro TTS model"
        );

        let engine = KokoroTts::new(KokoroTtsConfig {
            model: path_to_string(&model_path)?,
            voices: path_to_string(&voices_path)?,
            tokens: path_to_string(&tokens_path)?,
            data_dir: path_to_string(&data_dir)?,
            ..Default::default()
        });

        Ok(Self {
            engine: Mutex::new(engine),
            voice_id: config.voice.clone(),
            speaker_id: voice_id_to_speaker_id(&config.voice),
        })
    }

    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice_id
    }
}

impl SynthesisAdapter for SherpaSynthesizer {
    fn synthesize(&self, text: &str, speed: f32) -> Result<AudioArtifact, VoiceError> {
        if text.trim().is_empty() {
            return Ok(AudioArtifact::from_samples(Vec::new(), SHERPA_TTS_SAMPLE_RATE));
        }

        tracing::debug!(
            text_len = text.len(),
            voice = %self.voice_id,
            speaker_id = self.speaker_id,
            speed,
            "Synthesizing sentence (Sherpa Kokoro)"
        );

        let audio = self
            .engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create(text, self.speaker_id, speed)
            .map_err(|e| VoiceError::SynthesisError(e.to_string()))?;

        Ok(AudioArtifact::from_samples(audio.samples, audio.sample_rate))
    }
}

/// Map a Kokoro v0.19 voice ID to its sherpa-onnx speaker ID.
fn voice_id_to_speaker_id(voice_id: &str) -> i32 {
    match voice_id {
        "af" => 0,
        "af_bella" => 1,
        "af_nicole" => 2,
        "af_sarah" => 3,
        "af_sky" => 4,
        "am_adam" => 5,
        "am_michael" => 6,
        "bf_emma" => 7,
        "bf_isabella" => 8,
        "bm_george" => 9,
        "bm_lewis" => 10,
        _ => {
            tracing::warn!(voice = %voice_id, "Unknown Kokoro voice, using speaker 0");
            0
        }
    }
}

fn path_to_string(path: &Path) -> Result<String, VoiceError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| VoiceError::SynthesisError(format!("Invalid path: {}", path.display())))
}
