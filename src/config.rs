//! Application configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so an empty
//! file (or no file at all) yields a usable configuration.

use crate::{Result, TarotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings for the interpretation service
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature (0.0 = deterministic, 2.0 = wild)
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.9,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl OracleConfig {
    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured key, or the environment fallback; blank keys count as missing
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Settings for spoken questions
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Recognition locale, e.g. `ko-KR`
    pub locale: String,
    /// Path to the Whisper GGML model
    pub model_path: Option<PathBuf>,
    /// Hard cap on one utterance
    pub max_duration_secs: f32,
    /// Trailing silence that ends an utterance
    pub silence_secs: f32,
    /// Speech probability threshold (0.0 - 1.0)
    pub vad_threshold: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: "ko-KR".to_string(),
            model_path: None,
            max_duration_secs: 15.0,
            silence_secs: 1.2,
            vad_threshold: 0.5,
        }
    }
}

impl VoiceConfig {
    /// Set the locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the speech model path
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Language part of the locale (`ko-KR` → `ko`)
    pub fn language(&self) -> &str {
        self.locale
            .split(['-', '_'])
            .next()
            .unwrap_or(self.locale.as_str())
    }
}

/// Colour scheme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

/// Settings for the window and assets
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Directory holding `images/` and `videos/`
    pub assets_dir: PathBuf,
    /// Font with Hangul glyphs, added ahead of the defaults
    pub font_path: Option<PathBuf>,
    pub theme: ThemeMode,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("public"),
            font_path: None,
            theme: ThemeMode::Dark,
        }
    }
}

impl UiConfig {
    /// Set the assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Resolve an asset reference against the assets directory
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.assets_dir.join(relative)
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TarotConfig {
    pub oracle: OracleConfig,
    pub voice: VoiceConfig,
    pub ui: UiConfig,
}

impl TarotConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TarotConfig = toml::from_str(content)
            .map_err(|e| TarotError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Serialize back to TOML (without the API key)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TarotError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Set the oracle section
    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    /// Set the voice section
    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }

    /// Set the UI section
    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = ui;
        self
    }

    /// Check value ranges; a missing API key is not an error here
    pub fn validate(&self) -> Result<()> {
        let oracle = &self.oracle;
        if oracle.endpoint.trim().is_empty() {
            return Err(TarotError::ConfigError("oracle.endpoint is empty".to_string()));
        }
        if oracle.model.trim().is_empty() {
            return Err(TarotError::ConfigError("oracle.model is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&oracle.temperature) {
            return Err(TarotError::ConfigError(format!(
                "oracle.temperature must be within 0.0-2.0, got {}",
                oracle.temperature
            )));
        }
        if oracle.timeout_secs == 0 {
            return Err(TarotError::ConfigError(
                "oracle.timeout_secs must be positive".to_string(),
            ));
        }
        if self.voice.locale.trim().is_empty() {
            return Err(TarotError::ConfigError("voice.locale is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.voice.vad_threshold) {
            return Err(TarotError::ConfigError(format!(
                "voice.vad_threshold must be within 0.0-1.0, got {}",
                self.voice.vad_threshold
            )));
        }
        Ok(())
    }
}
