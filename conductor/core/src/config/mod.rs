//! TOML Configuration File Support
//!
//! Routing configuration lives in `~/.config/ai-way/routing.toml`. It declares
//! the providers the service can talk to, one candidate group per capability,
//! and the knobs of the circuit breaker and the streaming first-packet gate.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [providers.ollama]
//! url = "http://localhost:11434"
//! endpoints = { chat = "/api/chat", embedding = "/api/embed" }
//!
//! [providers.bailian]
//! url = "https://dashscope.aliyuncs.com/compatible-mode/v1"
//! api_key = "sk-..."
//! endpoints = { chat = "/chat/completions" }
//!
//! [chat]
//! default_model = "qwen-plus"
//! deep_thinking_model = "qwen3-thinking"
//!
//! [[chat.candidates]]
//! id = "qwen-plus"
//! provider = "bailian"
//! model = "qwen-plus-latest"
//! priority = 10
//!
//! [[chat.candidates]]
//! id = "qwen3-local"
//! provider = "ollama"
//! model = "qwen3:8b"
//! supports_thinking = true
//!
//! [selection]
//! failure_threshold = 2
//! open_duration_ms = 30000
//!
//! [stream]
//! first_packet_timeout_secs = 60
//! message_chunk_size = 5
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::health::HealthConfig;
use crate::routing::target::ModelCapability;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where the configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Model Configuration
// =============================================================================

/// Connection details for one provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(rename = "url")]
    pub base_url: String,

    /// API key, empty for unauthenticated local providers
    pub api_key: String,

    /// Endpoint paths keyed by capability (`chat`, `embedding`, `rerank`)
    pub endpoints: HashMap<String, String>,
}

/// A single configured (provider, model) pairing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCandidate {
    /// Unique model identifier, also the health-tracking key
    pub id: String,

    /// Provider name, matched against `ChatClient::provider()` and friends
    pub provider: String,

    /// Provider-side model name
    pub model: String,

    /// Full model URL, overrides provider base URL + endpoint
    pub url: Option<String>,

    /// Vector dimension (embedding models only)
    pub dimension: Option<u32>,

    /// Lower values are tried first
    pub priority: i32,

    /// Disabled candidates are never selected
    pub enabled: bool,

    /// Whether the model can produce a thinking trace
    pub supports_thinking: bool,
}

impl Default for ModelCandidate {
    fn default() -> Self {
        Self {
            id: String::new(),
            provider: String::new(),
            model: String::new(),
            url: None,
            dimension: None,
            priority: 100,
            enabled: true,
            supports_thinking: false,
        }
    }
}

impl ModelCandidate {
    /// Create an enabled candidate with default priority
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark as thinking-capable
    #[must_use]
    pub fn with_thinking(mut self) -> Self {
        self.supports_thinking = true;
        self
    }

    /// Set the embedding dimension
    #[must_use]
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Disable the candidate
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Candidate pool for one capability
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelGroup {
    /// Model tried first for ordinary requests
    pub default_model: Option<String>,

    /// Model tried first for thinking requests
    pub deep_thinking_model: Option<String>,

    /// Configured candidates
    pub candidates: Vec<ModelCandidate>,
}

/// Circuit breaker section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Consecutive failures that open a model's circuit
    pub failure_threshold: u32,

    /// How long an opened circuit stays open
    pub open_duration_ms: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            open_duration_ms: 30_000,
        }
    }
}

/// Streaming section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Maximum wait for a candidate's first content, completion or error
    pub first_packet_timeout_secs: u64,

    /// Characters per message a transport re-splits streamed content into
    ///
    /// Not read by the routing engine. Carried here so the surface that
    /// relays a committed stream to end users shares one configuration file.
    pub message_chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            first_packet_timeout_secs: 60,
            message_chunk_size: 5,
        }
    }
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingToml {
    /// Providers keyed by name
    pub providers: HashMap<String, ProviderConfig>,

    /// Chat candidates
    pub chat: ModelGroup,

    /// Embedding candidates
    pub embedding: ModelGroup,

    /// Rerank candidates
    pub rerank: ModelGroup,

    /// Circuit breaker settings
    pub selection: SelectionConfig,

    /// Streaming settings
    pub stream: StreamConfig,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Loaded routing configuration plus where it came from
#[derive(Clone, Debug, Default)]
pub struct RoutingConfig {
    /// Parsed settings
    pub settings: RoutingToml,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::Default
    }
}

impl RoutingConfig {
    /// Wrap already-built settings (tests, embedding applications)
    #[must_use]
    pub fn from_settings(settings: RoutingToml) -> Self {
        Self {
            settings,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Candidate group for a capability
    #[must_use]
    pub fn group(&self, capability: ModelCapability) -> &ModelGroup {
        match capability {
            ModelCapability::Chat => &self.settings.chat,
            ModelCapability::Embedding => &self.settings.embedding,
            ModelCapability::Rerank => &self.settings.rerank,
        }
    }

    /// Circuit breaker parameters for the health store
    #[must_use]
    pub fn health_config(&self) -> HealthConfig {
        HealthConfig {
            failure_threshold: self.settings.selection.failure_threshold,
            open_duration: Duration::from_millis(self.settings.selection.open_duration_ms),
        }
    }

    /// First-packet wait used by streaming chat
    #[must_use]
    pub fn first_packet_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.stream.first_packet_timeout_secs)
    }

    /// Check cross-references and obviously broken values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.stream.first_packet_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "stream.first_packet_timeout_secs must be greater than 0".to_string(),
            ));
        }

        for capability in ModelCapability::ALL {
            let group = self.group(capability);
            let mut seen = HashSet::new();

            for candidate in &group.candidates {
                if candidate.id.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "{capability} candidate with empty id"
                    )));
                }
                if candidate.provider.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "{capability} candidate '{}' has no provider",
                        candidate.id
                    )));
                }
                if !self.settings.providers.contains_key(&candidate.provider) {
                    return Err(ConfigError::ValidationError(format!(
                        "{capability} candidate '{}' references unknown provider '{}'",
                        candidate.id, candidate.provider
                    )));
                }
                if !seen.insert(candidate.id.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "duplicate {capability} candidate id '{}'",
                        candidate.id
                    )));
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/ai-way/routing.toml` or
/// `~/.config/ai-way/routing.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ai-way").join("routing.toml"))
}

/// Load configuration from the default path
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<RoutingConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then apply environment overrides
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RoutingConfig, ConfigError> {
    let mut config = RoutingConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            config.settings = toml::from_str(&toml_content)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded routing configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Apply `ROUTING_*` overrides using the given variable lookup
pub fn apply_env_overrides<F>(config: &mut RoutingConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(n) = lookup("ROUTING_FAILURE_THRESHOLD").and_then(|v| v.parse::<u32>().ok()) {
        config.settings.selection.failure_threshold = n;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = lookup("ROUTING_OPEN_DURATION_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.settings.selection.open_duration_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) =
        lookup("ROUTING_FIRST_PACKET_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
    {
        config.settings.stream.first_packet_timeout_secs = secs;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// Tests
// =============================================================================
