//! Read-aloud error types.

use std::path::PathBuf;

use crate::settings::SettingsError;

/// Errors that can occur while segmenting, synthesizing or playing text.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Failed to open audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The dedicated audio thread is gone (panicked or shut down).
    #[error("Audio thread is not running")]
    AudioThreadDied,

    /// Failed to synthesize speech.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// The audio sink failed while playing a sentence.
    #[error("Audio playback failed: {0}")]
    PlaybackError(String),

    /// A sentence failed to synthesize or play; the session was aborted.
    #[error("Sentence {index} failed ({text:?}): {source}")]
    SentenceFailed {
        /// Zero-based index of the failing sentence in the played sequence.
        index: usize,
        /// The sentence text handed to the synthesizer.
        text: String,
        /// The underlying synthesis or playback error.
        source: Box<VoiceError>,
    },

    /// A playback session is already running.
    #[error("A playback session is already active")]
    AlreadyActive,

    /// No playback session is running.
    #[error("No playback session is active")]
    NotActive,

    /// Translation was requested without any selected text.
    #[error("No text selected")]
    NoActiveSelection,

    /// The translation collaborator failed.
    #[error("Translation failed: {0}")]
    TranslationError(String),

    /// Model or program not found at expected path.
    #[error("Voice model not found at {0}")]
    ModelNotFound(PathBuf),

    /// Invalid settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// IO error (temporary files, input text).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceError {
    /// Wrap a per-sentence failure with the sentence's index and text.
    pub(crate) fn sentence_failed(index: usize, text: &str, source: Self) -> Self {
        Self::SentenceFailed {
            index,
            text: text.to_string(),
            source: Box::new(source),
        }
    }
}
