//! Configuration loading and validation for Clawlet.
//!
//! Loads configuration from `~/.clawlet/config.toml` with environment
//! variable overrides. Every field has a default, so a missing file (or a
//! file with only a few keys) is fine.

use clawlet_core::profile::{Profile, ProfileTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.clawlet/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default backend
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Conversation memory persistence
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Per-profile memory limits
    #[serde(default)]
    pub profiles: ProfileTable,

    /// Backend-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.2:1b".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}

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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("profiles", &self.profiles)
            .field("providers", &self.providers)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

/// Settings for one backend, keyed by name under `[providers.<name>]`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Any accepted spelling; unknown values fall back to `HIGH_POWER`.
    #[serde(default)]
    pub profile: Profile,

    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    /// Stream backend output to the terminal as it arrives.
    #[serde(default)]
    pub stream: bool,

    /// Keep `<think>` sections in conversation memory.
    #[serde(default)]
    pub record_thoughts: bool,
}

fn default_max_turns() -> usize {
    10
}
fn default_backend_timeout_secs() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            max_turns: default_max_turns(),
            backend_timeout_secs: default_backend_timeout_secs(),
            stream: false,
            record_thoughts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// JSON file holding conversation memory. Defaults to
    /// `~/.clawlet/memory.json` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Key the message list is stored under.
    #[serde(default = "default_memory_key")]
    pub key: String,
}

fn default_memory_key() -> String {
    "messages".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_memory_key(),
        }
    }
}

impl MemoryConfig {
    /// Configured path, or the default under the config directory.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("memory.json"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Collect backend and tool timings.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Priority: env vars > config file > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment-style overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("CLAWLET_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("CLAWLET_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("CLAWLET_MODEL") {
            self.default_model = model;
        }

        if let Some(profile) = lookup("CLAWLET_PROFILE") {
            self.agent.profile = Profile::normalize(&profile);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".clawlet")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be at least 1".into(),
            ));
        }

        if self.agent.backend_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.backend_timeout_secs must be at least 1".into(),
            ));
        }

        if self.memory.key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "memory.key must not be empty".into(),
            ));
        }

        for (name, limits) in [
            ("low_power", self.profiles.low_power),
            ("high_power", self.profiles.high_power),
            ("chat", self.profiles.chat),
        ] {
            if limits.max_messages == 0 || limits.max_bytes == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "profiles.{name}: max_messages and max_bytes must be positive"
                )));
            }
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            agent: AgentConfig::default(),
            memory: MemoryConfig::default(),
            profiles: ProfileTable::default(),
            providers: HashMap::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Get the user's home directory.
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

impl From<ConfigError> for clawlet_core::Error {
    fn from(e: ConfigError) -> Self {
        clawlet_core::Error::Config {
            message: e.to_string(),
        }
    }
}
