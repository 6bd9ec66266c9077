//! Main commands enum and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Speak a text file sentence by sentence
    ///
    /// While speaking, type a control line and press Enter:
    /// p/pause, r/resume, s/stop, +, -, speed <x>, q/quit.
    /// Ctrl-C stops playback.
    Speak {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        synth: SynthArgs,
    },

    /// Show how a text is split into sentences and where each one is found
    Segment {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Translate a selection or the word at a character offset
    Translate {
        #[command(flatten)]
        args: TranslateArgs,
    },
}

/// Where the text comes from and how results are printed.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// UTF-8 text file to read ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Start at this character offset (like speaking from the cursor)
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// Print machine-readable JSON lines instead of styled text
    #[arg(long)]
    pub json: bool,
}

/// Synthesis and playback options (flags fall back to `LECTOR_*` variables).
#[derive(Args, Debug, Clone, Default)]
pub struct SynthArgs {
    /// Initial speech speed (0.5–2.0)
    #[arg(long, env = "LECTOR_SPEED")]
    pub speed: Option<f32>,

    /// Speech program to run per sentence
    #[arg(long, env = "LECTOR_SYNTH_PROGRAM")]
    pub program: Option<String>,

    /// Voice passed to the speech program
    #[arg(long, env = "LECTOR_VOICE")]
    pub voice: Option<String>,

    /// How often a paused session re-checks its signals, in milliseconds
    #[arg(long, env = "LECTOR_POLL_INTERVAL_MS", hide = true)]
    pub poll_interval_ms: Option<u64>,

    /// Kokoro model directory; selects the local sherpa-onnx synthesizer
    #[cfg(feature = "sherpa")]
    #[arg(long, env = "LECTOR_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,
}

/// What to translate and how (flags fall back to `LECTOR_*` variables).
#[derive(Args, Debug, Clone, Default)]
pub struct TranslateArgs {
    /// UTF-8 text file to select from ("-" or omitted reads stdin)
    #[arg(conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Translate this text instead of reading a file
    #[arg(long)]
    pub text: Option<String>,

    /// Translate the word covering this character offset
    #[arg(long, conflicts_with = "text")]
    pub at: Option<usize>,

    /// With --at, translate the selection [at, end) instead of one word
    #[arg(long, requires = "at")]
    pub end: Option<usize>,

    /// Source language code
    #[arg(long = "from-lang", env = "LECTOR_SOURCE_LANG")]
    pub source_language: Option<String>,

    /// Target language code
    #[arg(long = "to-lang", env = "LECTOR_TARGET_LANG")]
    pub target_language: Option<String>,

    /// Translation program (translate-shell compatible)
    #[arg(long = "translator", env = "LECTOR_TRANSLATE_PROGRAM")]
    pub program: Option<String>,

    /// Print a JSON object instead of styled text
    #[arg(long)]
    pub json: bool,
}
