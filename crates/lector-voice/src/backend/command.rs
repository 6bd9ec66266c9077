//! External-program synthesis backend.
//!
//! Runs an `espeak-ng`-compatible program once per sentence. The sentence is
//! written to the program's stdin, the program writes a WAV file into a
//! fresh temporary file, and the WAV is decoded with `rodio`. The temporary
//! file travels with the returned [`AudioArtifact`] and is removed when the
//! artifact is dropped.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rodio::{Decoder, Source};

use crate::artifact::AudioArtifact;
use crate::backend::SynthesisAdapter;
use crate::error::VoiceError;
use crate::settings::DEFAULT_SYNTH_PROGRAM;

/// `espeak-ng`'s default speaking rate, in words per minute.
pub const DEFAULT_BASE_WPM: u32 = 175;

/// Sample rate reported for empty (whitespace-only) sentences.
const SILENT_SAMPLE_RATE: u32 = 22_050;

/// Configuration for [`CommandSynthesizer`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommandTtsConfig {
    /// Program to run (looked up on `PATH`).
    pub program: String,

    /// Voice passed with `-v`, if any.
    pub voice: Option<String>,

    /// Words per minute at speed 1.0.
    pub base_wpm: u32,
}

impl Default for CommandTtsConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SYNTH_PROGRAM.to_string(),
            voice: None,
            base_wpm: DEFAULT_BASE_WPM,
        }
    }
}

/// Synthesizes sentences by shelling out to a speech program.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    config: CommandTtsConfig,
    temp_dir: Option<PathBuf>,
}

impl CommandSynthesizer {
    #[must_use]
    pub const fn new(config: CommandTtsConfig) -> Self {
        Self {
            config,
            temp_dir: None,
        }
    }

    /// Write temporary WAV files into `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn config(&self) -> &CommandTtsConfig {
        &self.config
    }

    /// Speaking rate for `speed`, never below 1 wpm.
    #[must_use]
    pub fn words_per_minute(&self, speed: f32) -> u32 {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let wpm = (self.config.base_wpm as f32 * speed).round() as u32;
        wpm.max(1)
    }

    /// Command-line arguments for one invocation writing to `output`.
    fn args(&self, output: &Path, speed: f32) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--stdin".into(),
            "-w".into(),
            output.as_os_str().to_owned(),
            "-s".into(),
            self.words_per_minute(speed).to_string().into(),
        ];
        if let Some(voice) = &self.config.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args
    }

    fn temp_wav(&self) -> Result<tempfile::TempPath, VoiceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("lector-").suffix(".wav");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file.into_temp_path())
    }

    fn run_program(&self, text: &str, output: &Path, speed: f32) -> Result<(), VoiceError> {
        let program = &self.config.program;
        let mut child = Command::new(program)
            .args(self.args(output, speed))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::SynthesisError(format!("failed to start {program}: {e}")))?;

        // Stdin is closed at the end of this statement, before the wait.
        let written = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(text.as_bytes()));

        // Always reap the child, even when it stopped reading early.
        let out = child
            .wait_with_output()
            .map_err(|e| VoiceError::SynthesisError(format!("failed to wait for {program}: {e}")))?;
        let stderr = String::from_utf8_lossy(&out.stderr);

        if !out.status.success() {
            return Err(VoiceError::SynthesisError(format!(
                "{program} exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        if let Err(e) = written {
            return Err(VoiceError::SynthesisError(format!(
                "failed to write text to {program}: {e}: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl SynthesisAdapter for CommandSynthesizer {
    fn synthesize(&self, text: &str, speed: f32) -> Result<AudioArtifact, VoiceError> {
        if text.trim().is_empty() {
            return Ok(AudioArtifact::from_samples(Vec::new(), SILENT_SAMPLE_RATE));
        }

        let path = self.temp_wav()?;
        tracing::debug!(
            program = %self.config.program,
            wpm = self.words_per_minute(speed),
            path = %path.display(),
            text_len = text.len(),
            "Synthesizing sentence"
        );

        // `path` is removed on every early return below.
        self.run_program(text, &path, speed)?;
        let (samples, channels, sample_rate) = decode_wav(&path)?;

        tracing::debug!(samples = samples.len(), sample_rate, "Sentence synthesized");

        Ok(AudioArtifact::from_samples(samples, sample_rate)
            .with_channels(channels)
            .with_backing_file(path))
    }
}

/// Decode a WAV file into interleaved f32 samples, channel count and rate.
pub fn decode_wav(path: &Path) -> Result<(Vec<f32>, u16, u32), VoiceError> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| VoiceError::SynthesisError(format!("invalid WAV {}: {e}", path.display())))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples().collect();

    Ok((samples, channels, sample_rate))
}
