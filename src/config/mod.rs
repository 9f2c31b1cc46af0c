//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_CHUNK_DURATION_SECS, DEFAULT_SILENCE_THRESHOLD_DB, MAX_CHUNK_DURATION_SECS,
    MIN_CHUNK_DURATION_SECS,
};

/// CLI options for vaultscribe. Every flag has a `VAULTSCRIBE_*` environment
/// mirror so sessions can be launched from scripts without repeating flags.
#[derive(Debug, Parser, Clone)]
#[command(
    about = "Dictate Markdown notes into an Obsidian-style vault via Whisper",
    author,
    version
)]
pub struct AppConfig {
    /// Root directory of the note vault
    #[arg(long = "vault-path", env = "VAULTSCRIBE_VAULT_PATH")]
    pub vault_path: PathBuf,

    /// Existing subfolder of the vault to write the session note into
    #[arg(long, env = "VAULTSCRIBE_SUBFOLDER")]
    pub subfolder: Option<String>,

    /// Whisper model size
    #[arg(
        long = "model-size",
        value_enum,
        env = "VAULTSCRIBE_MODEL_SIZE",
        default_value_t = ModelSize::Base
    )]
    pub model_size: ModelSize,

    /// Recording chunk duration in seconds
    #[arg(
        long = "chunk-duration",
        env = "VAULTSCRIBE_CHUNK_DURATION",
        default_value_t = DEFAULT_CHUNK_DURATION_SECS
    )]
    pub chunk_duration: u64,

    /// Chunks quieter than this RMS level are dropped without transcription (dBFS)
    #[arg(
        long = "silence-threshold-db",
        env = "VAULTSCRIBE_SILENCE_THRESHOLD_DB",
        default_value_t = DEFAULT_SILENCE_THRESHOLD_DB
    )]
    pub silence_threshold_db: f32,

    /// Language passed to Whisper ('auto' to detect)
    #[arg(long, env = "VAULTSCRIBE_LANG", default_value = "en")]
    pub lang: String,

    /// Directory holding downloaded ggml model weights
    #[arg(long = "model-dir", env = "VAULTSCRIBE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Preferred audio input device name
    #[arg(long = "input-device")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Run the full-screen TUI instead of the plain console printer
    #[arg(long, default_value_t = false)]
    pub tui: bool,

    /// Enable debug file logging
    #[arg(long = "logs", env = "VAULTSCRIBE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs)
    #[arg(long = "no-logs", env = "VAULTSCRIBE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

impl AppConfig {
    /// Directory the session note is created in: the vault root, or the
    /// configured subfolder beneath it.
    pub fn note_dir(&self) -> PathBuf {
        match &self.subfolder {
            Some(sub) => self.vault_path.join(sub),
            None => self.vault_path.clone(),
        }
    }
}

/// Whisper model sizes understood by the downloader and loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn label(self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }

    /// GGML weight file name for this size, as published by whisper.cpp.
    /// "large" maps to the v3 weights.
    pub fn file_name(self) -> &'static str {
        match self {
            ModelSize::Tiny => "ggml-tiny.bin",
            ModelSize::Base => "ggml-base.bin",
            ModelSize::Small => "ggml-small.bin",
            ModelSize::Medium => "ggml-medium.bin",
            ModelSize::Large => "ggml-large-v3.bin",
        }
    }

    /// Next size up, saturating at large. Used by the TUI selector.
    pub fn next(self) -> Self {
        match self {
            ModelSize::Tiny => ModelSize::Base,
            ModelSize::Base => ModelSize::Small,
            ModelSize::Small => ModelSize::Medium,
            ModelSize::Medium => ModelSize::Large,
            ModelSize::Large => ModelSize::Large,
        }
    }

    /// Next size down, saturating at tiny.
    pub fn prev(self) -> Self {
        match self {
            ModelSize::Tiny => ModelSize::Tiny,
            ModelSize::Base => ModelSize::Tiny,
            ModelSize::Small => ModelSize::Base,
            ModelSize::Medium => ModelSize::Small,
            ModelSize::Large => ModelSize::Medium,
        }
    }
}
