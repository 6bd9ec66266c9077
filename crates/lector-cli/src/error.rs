//! CLI-specific error types and mappings.
//!
//! Maps [`VoiceError`] to exit codes and user-facing messages.

use lector_voice::{SettingsError, VoiceError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Speech synthesis or playback failed.
    #[error("{0}")]
    Voice(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable audio output.
    #[error("Audio output unavailable: {0}")]
    Audio(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Voice(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Audio(_) => 69,    // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Settings(e) => e.into(),
            VoiceError::Io(e) => e.into(),
            VoiceError::ModelNotFound(path) => {
                Self::Config(format!("model not found at {}", path.display()))
            }
            VoiceError::OutputStreamError(_) | VoiceError::AudioThreadDied => {
                Self::Audio(err.to_string())
            }
            VoiceError::AlreadyActive | VoiceError::NotActive | VoiceError::NoActiveSelection => {
                Self::Arguments(err.to_string())
            }
            VoiceError::SynthesisError(_)
            | VoiceError::PlaybackError(_)
            | VoiceError::SentenceFailed { .. }
            | VoiceError::TranslationError(_) => Self::Voice(err.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
