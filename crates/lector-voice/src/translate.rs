//! Translation collaborator boundary.
//!
//! Translation runs independently of playback: a selection (or the word
//! under the pointer) is handed to a [`Translator`] and the result shown to
//! the user. [`CommandTranslator`] delegates to an external program
//! (translate-shell by default), so no network protocol lives here.

use std::process::Stdio;

use serde::{Deserialize, Serialize};

use crate::error::VoiceError;
use crate::position::char_slice;
use crate::settings::{DEFAULT_TRANSLATE_PROGRAM, Settings};

/// Source and target language codes (e.g. `"da"` → `"ru"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            source: "da".to_string(),
            target: "ru".to_string(),
        }
    }
}

impl From<&Settings> for LanguagePair {
    fn from(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            source: settings.source_language.clone().unwrap_or(defaults.source),
            target: settings.target_language.clone().unwrap_or(defaults.target),
        }
    }
}

/// Translates short phrases.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `pair.source` to `pair.target`.
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, VoiceError>;
}

/// Translates by running an external program once per request.
///
/// The program is invoked as `<program> -brief <source>:<target> <text>`
/// (translate-shell's interface) and must print the translation on stdout.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
}

impl CommandTranslator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(text: &str, pair: &LanguagePair) -> [String; 3] {
        [
            "-brief".to_string(),
            format!("{}:{}", pair.source, pair.target),
            text.to_string(),
        ]
    }
}

impl Default for CommandTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSLATE_PROGRAM)
    }
}

#[async_trait::async_trait]
impl Translator for CommandTranslator {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, VoiceError> {
        let program = &self.program;
        let output = tokio::process::Command::new(program)
            .args(Self::args(text, pair))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VoiceError::TranslationError(format!("failed to start {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::TranslationError(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let translation = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if translation.is_empty() {
            return Err(VoiceError::TranslationError(format!(
                "{program} returned no translation"
            )));
        }
        Ok(translation)
    }
}

/// Translate the current selection.
///
/// # Errors
///
/// [`VoiceError::NoActiveSelection`] when nothing (or only whitespace) is
/// selected; otherwise whatever the translator reports.
pub async fn translate_selection(
    translator: &dyn Translator,
    selection: Option<&str>,
    pair: &LanguagePair,
) -> Result<String, VoiceError> {
    let text = selection
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(VoiceError::NoActiveSelection)?;

    tracing::debug!(
        chars = text.chars().count(),
        source = %pair.source,
        target = %pair.target,
        "Translating selection"
    );
    translator.translate(text, pair).await
}

/// A word and its character range in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// The word covering character `offset`, if that character is part of one.
///
/// Words are runs of alphanumeric characters and underscores.
#[must_use]
pub fn word_at(text: &str, offset: usize) -> Option<WordSpan> {
    let chars: Vec<char> = text.chars().collect();
    if !chars.get(offset).copied().is_some_and(is_word_char) {
        return None;
    }

    let start = chars[..offset]
        .iter()
        .rposition(|&c| !is_word_char(c))
        .map_or(0, |i| i + 1);
    let end = chars[offset..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |i| offset + i);

    Some(WordSpan {
        start,
        end,
        text: char_slice(text, start, end).to_string(),
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
