//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the voice engine is wired together
//! for the CLI adapter: settings from flags and environment, the
//! synthesizer backend, the rodio audio sink, the terminal highlight and
//! the translator.

use std::sync::Arc;

use lector_voice::backend::command::DEFAULT_BASE_WPM;
use lector_voice::{
    CommandSynthesizer, CommandTranslator, CommandTtsConfig, HighlightSink, LocalAudioSink,
    PlaybackConfig, PlaybackController, PlaybackEvent, Settings, SynthesisAdapter, Translator,
    validate_settings,
};
use tokio::sync::mpsc;

use crate::commands::{SynthArgs, TranslateArgs};
use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Validated read-aloud settings.
    pub settings: Settings,
    /// Kokoro model directory, when the sherpa backend is selected.
    #[cfg(feature = "sherpa")]
    pub model_dir: Option<std::path::PathBuf>,
}

impl CliConfig {
    /// Build the config from defaults overlaid with flags and `LECTOR_*`
    /// variables, then validate it.
    pub fn from_args(args: &SynthArgs) -> Result<Self, CliError> {
        let mut settings = Settings::with_defaults();
        if let Some(speed) = args.speed {
            settings.speed = Some(speed);
        }
        if let Some(program) = &args.program {
            settings.synth_program = Some(program.clone());
        }
        if let Some(voice) = &args.voice {
            settings.voice = Some(voice.clone());
        }
        if let Some(ms) = args.poll_interval_ms {
            settings.poll_interval_ms = Some(ms);
        }

        validate_settings(&settings)?;

        Ok(Self {
            settings,
            #[cfg(feature = "sherpa")]
            model_dir: args.model_dir.clone(),
        })
    }
}

/// Translation settings: defaults overlaid with flags and `LECTOR_*`
/// variables, validated.
pub fn translate_settings(args: &TranslateArgs) -> Result<Settings, CliError> {
    let mut settings = Settings::with_defaults();
    if let Some(source) = &args.source_language {
        settings.source_language = Some(source.clone());
    }
    if let Some(target) = &args.target_language {
        settings.target_language = Some(target.clone());
    }
    if let Some(program) = &args.program {
        settings.translate_program = Some(program.clone());
    }

    validate_settings(&settings)?;
    Ok(settings)
}

/// Instantiate the translator named by the settings.
pub fn build_translator(settings: &Settings) -> Arc<dyn Translator> {
    let program = settings.effective_translate_program();
    tracing::debug!(%program, "Using command translator");
    Arc::new(CommandTranslator::new(program))
}

/// Instantiate the synthesizer selected by the config.
pub fn build_synthesizer(config: &CliConfig) -> Result<Arc<dyn SynthesisAdapter>, CliError> {
    #[cfg(feature = "sherpa")]
    if let Some(dir) = &config.model_dir {
        use lector_voice::backend::sherpa_tts::{SherpaSynthesizer, SherpaTtsConfig};

        let mut tts_config = SherpaTtsConfig::default();
        if let Some(voice) = &config.settings.voice {
            tts_config.voice.clone_from(voice);
        }
        tracing::debug!(dir = %dir.display(), voice = %tts_config.voice, "Using sherpa synthesizer");
        return Ok(Arc::new(SherpaSynthesizer::load(dir, &tts_config)?));
    }

    let tts_config = CommandTtsConfig {
        program: config.settings.effective_synth_program().to_string(),
        voice: config.settings.voice.clone(),
        base_wpm: DEFAULT_BASE_WPM,
    };
    tracing::debug!(program = %tts_config.program, "Using command synthesizer");
    Ok(Arc::new(CommandSynthesizer::new(tts_config)))
}

/// Compose a playback controller on the default audio output.
pub fn build_controller(
    config: &CliConfig,
    highlight: Arc<dyn HighlightSink>,
) -> Result<(PlaybackController, mpsc::UnboundedReceiver<PlaybackEvent>), CliError> {
    let synth = build_synthesizer(config)?;
    let audio = Arc::new(LocalAudioSink::new()?);
    Ok(PlaybackController::new(
        synth,
        audio,
        highlight,
        PlaybackConfig::from(&config.settings),
    ))
}
