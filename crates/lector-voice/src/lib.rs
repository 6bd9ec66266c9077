#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use serde_json as _;

pub mod artifact;
pub mod audio_io;
pub mod audio_local;
pub mod audio_thread;
pub mod backend;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod playback;
pub mod position;
pub mod segment;
pub mod settings;
pub mod signals;
pub mod translate;

// Re-export key types for convenience
pub use artifact::AudioArtifact;
pub use audio_io::AudioSink;
pub use audio_local::LocalAudioSink;
pub use backend::SynthesisAdapter;
pub use backend::command::{CommandSynthesizer, CommandTtsConfig};
pub use controller::{PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackState};
pub use error::VoiceError;
pub use highlight::HighlightSink;
pub use position::{PositionMap, SentenceUnit, SkippedSentence, map_positions, map_positions_from};
pub use segment::split_sentences;
pub use settings::{Settings, SettingsError, validate_settings};
pub use translate::{
    CommandTranslator, LanguagePair, Translator, WordSpan, translate_selection, word_at,
};
