//! Model targets
//!
//! A [`ModelTarget`] is the immutable unit the routing loop iterates over: the
//! candidate's id plus everything a client needs to reach it. Targets are built
//! fresh from configuration on every call and carry no state of their own.

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, ModelCandidate, ProviderConfig};

// ============================================================================
// Capability
// ============================================================================

/// The three kinds of model the service routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelCapability {
    /// Conversational generation
    Chat,
    /// Text embedding
    Embedding,
    /// Relevance reranking
    Rerank,
}

impl ModelCapability {
    /// All capabilities in display order
    pub const ALL: [ModelCapability; 3] = [Self::Chat, Self::Embedding, Self::Rerank];

    /// Human-readable label used in errors and logs
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Embedding => "Embedding",
            Self::Rerank => "Rerank",
        }
    }

    /// Key into a provider's `endpoints` table
    #[must_use]
    pub fn endpoint_key(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Embedding => "embedding",
            Self::Rerank => "rerank",
        }
    }
}

impl fmt::Display for ModelCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Target
// ============================================================================

/// One routable (provider, model) pairing
///
/// Cloning is cheap: the candidate and provider sections are shared.
#[derive(Debug, Clone)]
pub struct ModelTarget {
    id: String,
    candidate: Arc<ModelCandidate>,
    provider: Arc<ProviderConfig>,
}

impl ModelTarget {
    /// Build a target from a configured candidate and its provider section
    pub fn new(candidate: ModelCandidate, provider: ProviderConfig) -> Self {
        Self {
            id: candidate.id.clone(),
            candidate: Arc::new(candidate),
            provider: Arc::new(provider),
        }
    }

    /// Candidate id, also the health-tracking key
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Provider name used to resolve a client
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.candidate.provider
    }

    /// Provider-side model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.candidate.model
    }

    #[must_use]
    pub fn candidate(&self) -> &ModelCandidate {
        &self.candidate
    }

    #[must_use]
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Resolve the full URL of this target for a capability
    ///
    /// The candidate's own `url` wins when set. Otherwise the provider base URL
    /// is joined with the capability endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] when neither source yields a URL.
    pub fn resolve_url(&self, capability: ModelCapability) -> Result<String, ConfigError> {
        if let Some(url) = self.candidate.url.as_deref() {
            if !url.trim().is_empty() {
                return Ok(url.to_string());
            }
        }

        let base = self.provider.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "provider '{}' has no url for model '{}'",
                self.provider_name(),
                self.id
            )));
        }

        let endpoint = self
            .provider
            .endpoints
            .get(capability.endpoint_key())
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "provider '{}' has no {} endpoint",
                    self.provider_name(),
                    capability.endpoint_key()
                ))
            })?;

        Ok(join_url(base, endpoint))
    }
}

fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
