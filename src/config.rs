//! Configuration resolution for pagemill
//!
//! Settings resolve with ENV → TOML → built-in default priority. Every
//! recognized option has a working default so the service starts with no
//! configuration at all (the text-generation key being absent degrades the
//! summarize stage, it does not prevent startup).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";
const DEFAULT_GENERATION_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_GENERATION_MODEL: &str = "anthropic/claude-3.5-haiku";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// HTTP listen address
    pub bind_address: String,

    // Pipeline limits
    /// Hard cap on fetched body size (bytes)
    pub max_content_length_bytes: usize,
    /// Characters per chunk
    pub chunk_size_chars: usize,
    /// Hard ceiling on chunk count
    pub max_chunks: usize,
    /// Combined character budget for the summarize prompt
    pub summary_input_budget_chars: usize,

    // External call timeouts (seconds)
    pub fetch_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub tts_timeout_secs: u64,

    // Text-generation service
    /// Bearer credential; absent key degrades summarization, never crashes
    pub generation_api_key: Option<String>,
    pub generation_base_url: String,
    pub generation_model: String,

    // Text-to-speech service (optional)
    /// TTS endpoint; unset disables audio rendering entirely
    pub tts_endpoint: Option<String>,
    /// Directory for rendered audio artifacts
    pub audio_dir: PathBuf,

    // Worker pool
    /// Number of concurrent pipeline workers
    pub workers: usize,

    /// Whether a degraded (fallback) summary still completes the job.
    /// When false, a summarization failure fails the job instead.
    pub accept_fallback_summary: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pagemill.db"),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_content_length_bytes: 1_000_000,
            chunk_size_chars: 1000,
            max_chunks: 50,
            summary_input_budget_chars: 10_000,
            fetch_timeout_secs: 30,
            generation_timeout_secs: 60,
            tts_timeout_secs: 30,
            generation_api_key: None,
            generation_base_url: DEFAULT_GENERATION_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            tts_endpoint: None,
            audio_dir: PathBuf::from("audio"),
            workers: 4,
            accept_fallback_summary: true,
        }
    }
}

impl Settings {
    /// Load settings with ENV → TOML → default priority.
    ///
    /// The TOML file path comes from `PAGEMILL_CONFIG`, falling back to
    /// `pagemill.toml` in the working directory (missing file is fine).
    pub fn load() -> Result<Self> {
        let toml_path = std::env::var("PAGEMILL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("pagemill.toml"));

        let mut settings = if toml_path.exists() {
            let loaded = Self::from_toml_file(&toml_path)?;
            info!("Settings loaded from TOML: {}", toml_path.display());
            loaded
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();

        if settings.generation_api_key.is_none() {
            warn!(
                "No text-generation API key configured (PAGEMILL_GENERATION_API_KEY); \
                 summaries will use the degraded fallback"
            );
        }

        Ok(settings)
    }

    /// Parse settings from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Environment variables override TOML values field by field.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PAGEMILL_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("PAGEMILL_BIND_ADDRESS") {
            self.bind_address = v;
        }
        if let Ok(v) = std::env::var("PAGEMILL_MAX_CONTENT_LENGTH_BYTES") {
            match v.parse() {
                Ok(n) => self.max_content_length_bytes = n,
                Err(_) => warn!("Ignoring non-numeric PAGEMILL_MAX_CONTENT_LENGTH_BYTES: {}", v),
            }
        }
        if let Ok(v) = std::env::var("PAGEMILL_CHUNK_SIZE_CHARS") {
            match v.parse() {
                Ok(n) => self.chunk_size_chars = n,
                Err(_) => warn!("Ignoring non-numeric PAGEMILL_CHUNK_SIZE_CHARS: {}", v),
            }
        }
        if let Ok(v) = std::env::var("PAGEMILL_MAX_CHUNKS") {
            match v.parse() {
                Ok(n) => self.max_chunks = n,
                Err(_) => warn!("Ignoring non-numeric PAGEMILL_MAX_CHUNKS: {}", v),
            }
        }
        if let Ok(v) = std::env::var("PAGEMILL_WORKERS") {
            match v.parse() {
                Ok(n) => self.workers = n,
                Err(_) => warn!("Ignoring non-numeric PAGEMILL_WORKERS: {}", v),
            }
        }
        if let Ok(v) = std::env::var("PAGEMILL_GENERATION_API_KEY") {
            if is_valid_key(&v) {
                self.generation_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("PAGEMILL_GENERATION_BASE_URL") {
            self.generation_base_url = v;
        }
        if let Ok(v) = std::env::var("PAGEMILL_GENERATION_MODEL") {
            self.generation_model = v;
        }
        if let Ok(v) = std::env::var("PAGEMILL_TTS_ENDPOINT") {
            self.tts_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("PAGEMILL_AUDIO_DIR") {
            self.audio_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("PAGEMILL_ACCEPT_FALLBACK_SUMMARY") {
            match v.parse() {
                Ok(b) => self.accept_fallback_summary = b,
                Err(_) => warn!("Ignoring non-boolean PAGEMILL_ACCEPT_FALLBACK_SUMMARY: {}", v),
            }
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
