//! Configuration loading, validation, and management for Fireside.
//!
//! Loads configuration from `~/.fireside/config.toml` with environment
//! variable overrides. Validates all settings at startup. Prompt text is
//! carried as opaque configuration strings — the session core never
//! interprets it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.fireside/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion service base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Data directory for memories.json / chat.json / remember.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Session orchestration settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Prompt text (opaque strings)
    #[serde(default)]
    pub prompts: PromptConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            data_dir: default_data_dir(),
            session: SessionConfig::default(),
            prompts: PromptConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("data")
}

/// Session orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity before the transcript is consolidated
    #[serde(default = "default_inactivity_secs")]
    pub inactivity_threshold_secs: u64,

    /// How often the inactivity monitor wakes up
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,

    /// Maximum tool round-trips within a single turn before failing closed
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Location string stamped into the per-turn system marker
    #[serde(default)]
    pub location: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: default_inactivity_secs(),
            poll_interval_secs: default_poll_secs(),
            max_tool_rounds: default_max_tool_rounds(),
            location: String::new(),
        }
    }
}

fn default_inactivity_secs() -> u64 {
    180
}
fn default_poll_secs() -> u64 {
    15
}
fn default_max_tool_rounds() -> u32 {
    8
}

/// Prompt text used to seed and consolidate sessions.
///
/// These are deliberately opaque to the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Appended after the identity line in the opening system message
    #[serde(default = "default_initial_prompt")]
    pub initial: String,

    /// System prompt for the consolidation summarization call
    #[serde(default = "default_summary_prompt")]
    pub summary: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            initial: default_initial_prompt(),
            summary: default_summary_prompt(),
        }
    }
}

fn default_initial_prompt() -> String {
    "You are a personal companion. Speak naturally, remember what you are told, \
     and use your tools when something is worth keeping."
        .into()
}

fn default_summary_prompt() -> String {
    "You will be given a conversation transcript. Summarize it as concisely as \
     possible while retaining names, decisions, and anything worth remembering."
        .into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("data_dir", &self.data_dir)
            .field("session", &self.session)
            .field("prompts", &self.prompts)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.fireside/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `FIRESIDE_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("FIRESIDE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("FIRESIDE_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".fireside")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.session.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session.poll_interval_secs must be > 0".into(),
            ));
        }

        if self.session.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_tool_rounds must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.inactivity_threshold_secs, 180);
        assert_eq!(config.session.max_tool_rounds, 8);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(
            parsed.session.poll_interval_secs,
            config.session.poll_interval_secs
        );
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = AppConfig::default();
        config.session.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "gpt-4o");
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "model = \"gpt-4o-mini\"").unwrap();
        writeln!(tmp, "[session]").unwrap();
        writeln!(tmp, "inactivity_threshold_secs = 60").unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.session.inactivity_threshold_secs, 60);
        // Untouched fields keep their defaults
        assert_eq!(config.session.poll_interval_secs, 15);
        assert!(!config.prompts.summary.is_empty());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
