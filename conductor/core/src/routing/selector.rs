//! Candidate selection
//!
//! The routing services consume candidates as an opaque ordered list. The
//! [`ModelSelector`] trait is the seam for smarter policies; the
//! [`ConfiguredSelector`] shipped here only applies configuration order.

use std::sync::Arc;

use super::target::{ModelCapability, ModelTarget};
use crate::config::{ModelCandidate, RoutingConfig};

/// Source of ordered candidates per capability
pub trait ModelSelector: Send + Sync {
    /// Chat candidates; `thinking` restricts to thinking-capable models
    fn select_chat_candidates(&self, thinking: bool) -> Vec<ModelTarget>;

    fn select_embedding_candidates(&self) -> Vec<ModelTarget>;

    fn select_rerank_candidates(&self) -> Vec<ModelTarget>;

    /// The embedding target whose dimension the index is built for
    fn select_default_embedding(&self) -> Option<ModelTarget> {
        self.select_embedding_candidates().into_iter().next()
    }
}

/// Configuration-order selector
///
/// Keeps enabled candidates whose provider is configured. The group's default
/// model (or deep-thinking model for thinking requests) goes first, then
/// ascending `priority`, then file order.
#[derive(Debug, Clone)]
pub struct ConfiguredSelector {
    config: Arc<RoutingConfig>,
}

impl ConfiguredSelector {
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }

    fn ordered(
        &self,
        capability: ModelCapability,
        preferred: Option<&str>,
        thinking_only: bool,
    ) -> Vec<ModelTarget> {
        let providers = &self.config.settings.providers;
        let group = self.config.group(capability);

        let mut picked: Vec<(usize, &ModelCandidate)> = group
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .filter(|(_, c)| !thinking_only || c.supports_thinking)
            .filter(|(_, c)| {
                let known = providers.contains_key(&c.provider);
                if !known {
                    tracing::debug!(
                        capability = %capability,
                        model = %c.id,
                        provider = %c.provider,
                        "Candidate references unconfigured provider, ignoring"
                    );
                }
                known
            })
            .collect();

        picked.sort_by_key(|(index, c)| (Some(c.id.as_str()) != preferred, c.priority, *index));

        picked
            .into_iter()
            .filter_map(|(_, c)| {
                providers
                    .get(&c.provider)
                    .map(|p| ModelTarget::new(c.clone(), p.clone()))
            })
            .collect()
    }
}

impl ModelSelector for ConfiguredSelector {
    fn select_chat_candidates(&self, thinking: bool) -> Vec<ModelTarget> {
        let chat = &self.config.settings.chat;
        let preferred = if thinking {
            chat.deep_thinking_model.as_deref()
        } else {
            chat.default_model.as_deref()
        };
        self.ordered(ModelCapability::Chat, preferred, thinking)
    }

    fn select_embedding_candidates(&self) -> Vec<ModelTarget> {
        let preferred = self.config.settings.embedding.default_model.as_deref();
        self.ordered(ModelCapability::Embedding, preferred, false)
    }

    fn select_rerank_candidates(&self) -> Vec<ModelTarget> {
        let preferred = self.config.settings.rerank.default_model.as_deref();
        self.ordered(ModelCapability::Rerank, preferred, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, RoutingToml};

    fn ids(targets: &[ModelTarget]) -> Vec<&str> {
        targets.iter().map(ModelTarget::id).collect()
    }

    fn selector(build: impl FnOnce(&mut RoutingToml)) -> ConfiguredSelector {
        let mut settings = RoutingToml::default();
        settings
            .providers
            .insert("ollama".into(), ProviderConfig::default());
        settings
            .providers
            .insert("bailian".into(), ProviderConfig::default());
        build(&mut settings);
        ConfiguredSelector::new(Arc::new(RoutingConfig::from_settings(settings)))
    }

    #[test]
    fn test_priority_then_config_order() {
        let selector = selector(|s| {
            s.chat.candidates = vec![
                ModelCandidate::new("c", "ollama", "c"),
                ModelCandidate::new("a", "ollama", "a").with_priority(5),
                ModelCandidate::new("b", "bailian", "b"),
            ];
        });

        assert_eq!(ids(&selector.select_chat_candidates(false)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_default_model_first() {
        let selector = selector(|s| {
            s.chat.default_model = Some("slow".into());
            s.chat.candidates = vec![
                ModelCandidate::new("fast", "ollama", "fast").with_priority(1),
                ModelCandidate::new("slow", "ollama", "slow").with_priority(50),
            ];
        });

        assert_eq!(ids(&selector.select_chat_candidates(false)), vec!["slow", "fast"]);
    }

    #[test]
    fn test_thinking_filters_and_prefers_deep_model() {
        let selector = selector(|s| {
            s.chat.default_model = Some("plain".into());
            s.chat.deep_thinking_model = Some("deep-b".into());
            s.chat.candidates = vec![
                ModelCandidate::new("plain", "ollama", "plain"),
                ModelCandidate::new("deep-a", "ollama", "deep-a").with_thinking(),
                ModelCandidate::new("deep-b", "bailian", "deep-b").with_thinking(),
            ];
        });

        assert_eq!(ids(&selector.select_chat_candidates(true)), vec!["deep-b", "deep-a"]);
    }

    #[test]
    fn test_disabled_and_unknown_provider_dropped() {
        let selector = selector(|s| {
            s.rerank.candidates = vec![
                ModelCandidate::new("off", "ollama", "off").disabled(),
                ModelCandidate::new("ghost", "siliconflow", "ghost"),
                ModelCandidate::new("on", "ollama", "on"),
            ];
        });

        assert_eq!(ids(&selector.select_rerank_candidates()), vec!["on"]);
    }

    #[test]
    fn test_default_embedding() {
        let selector = selector(|s| {
            s.embedding.default_model = Some("bge".into());
            s.embedding.candidates = vec![
                ModelCandidate::new("nomic", "ollama", "nomic").with_dimension(768),
                ModelCandidate::new("bge", "ollama", "bge-m3").with_dimension(1024),
            ];
        });

        let target = selector.select_default_embedding().unwrap();
        assert_eq!(target.id(), "bge");
        assert_eq!(target.candidate().dimension, Some(1024));
    }

    #[test]
    fn test_empty_group() {
        let selector = selector(|_| {});
        assert!(selector.select_embedding_candidates().is_empty());
        assert!(selector.select_default_embedding().is_none());
    }
}
