//! Read-aloud settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. Adapters (the CLI)
//! fill them from flags and environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Slowest speed offered by the speed control.
pub const MIN_SPEED: f32 = 0.5;

/// Fastest speed offered by the speed control.
pub const MAX_SPEED: f32 = 2.0;

/// Speed control resolution.
pub const SPEED_STEP: f32 = 0.1;

/// Default speech speed.
pub const DEFAULT_SPEED: f32 = 1.0;

/// Default bound on how long a paused worker waits between checks.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default external speech program.
pub const DEFAULT_SYNTH_PROGRAM: &str = "espeak-ng";

/// Default external translation program (translate-shell).
pub const DEFAULT_TRANSLATE_PROGRAM: &str = "trans";

/// Read-aloud settings.
///
/// All fields are optional to support partial overrides and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Initial speech speed multiplier.
    pub speed: Option<f32>,

    /// Pause poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,

    /// External speech program used by the command backend.
    pub synth_program: Option<String>,

    /// Voice identifier passed to the synthesizer.
    pub voice: Option<String>,

    /// Source language for translation lookups.
    pub source_language: Option<String>,

    /// Target language for translation lookups.
    pub target_language: Option<String>,

    /// External translation program.
    pub translate_program: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            speed: Some(DEFAULT_SPEED),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            synth_program: Some(DEFAULT_SYNTH_PROGRAM.to_string()),
            voice: None,
            source_language: Some("da".to_string()),
            target_language: Some("ru".to_string()),
            translate_program: Some(DEFAULT_TRANSLATE_PROGRAM.to_string()),
        }
    }

    /// Effective initial speed (with default fallback).
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }

    /// Effective pause poll interval (with default fallback).
    #[must_use]
    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Effective speech program (with default fallback).
    #[must_use]
    pub fn effective_synth_program(&self) -> &str {
        self.synth_program.as_deref().unwrap_or(DEFAULT_SYNTH_PROGRAM)
    }

    /// Effective translation program (with default fallback).
    #[must_use]
    pub fn effective_translate_program(&self) -> &str {
        self.translate_program
            .as_deref()
            .unwrap_or(DEFAULT_TRANSLATE_PROGRAM)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Speed must be between {MIN_SPEED} and {MAX_SPEED}, got {0}")]
    InvalidSpeed(f32),

    #[error("Poll interval must be between 1 and 1000 ms, got {0}")]
    InvalidPollInterval(u64),

    #[error("Speech program cannot be empty")]
    EmptySynthProgram,

    #[error("Translation program cannot be empty")]
    EmptyTranslateProgram,

    #[error("Language code cannot be empty")]
    EmptyLanguage,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(speed) = settings.speed {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(SettingsError::InvalidSpeed(speed));
        }
    }

    if let Some(interval) = settings.poll_interval_ms {
        if !(1..=1000).contains(&interval) {
            return Err(SettingsError::InvalidPollInterval(interval));
        }
    }

    if settings
        .synth_program
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptySynthProgram);
    }

    if settings
        .translate_program
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyTranslateProgram);
    }

    if [&settings.source_language, &settings.target_language]
        .into_iter()
        .flatten()
        .any(|lang| lang.trim().is_empty())
    {
        return Err(SettingsError::EmptyLanguage);
    }

    Ok(())
}

/// Clamp a requested speed into the control's range, snapped to its step.
#[must_use]
pub fn clamp_speed(speed: f32) -> f32 {
    if speed.is_nan() {
        return DEFAULT_SPEED;
    }
    let snapped = (speed / SPEED_STEP).round() * SPEED_STEP;
    snapped.clamp(MIN_SPEED, MAX_SPEED)
}
