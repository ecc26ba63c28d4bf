//! Routed embedding

use std::sync::Arc;

use crate::backend::{ClientRegistry, EmbeddingClient};
use crate::routing::{
    ModelCapability, ModelHealthStore, ModelRoutingExecutor, ModelSelector, ModelTarget,
    RoutingError,
};

pub struct RoutingEmbeddingService {
    selector: Arc<dyn ModelSelector>,
    executor: ModelRoutingExecutor,
    clients: ClientRegistry<dyn EmbeddingClient>,
}

impl RoutingEmbeddingService {
    pub fn new(
        selector: Arc<dyn ModelSelector>,
        health: Arc<ModelHealthStore>,
        clients: ClientRegistry<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            selector,
            executor: ModelRoutingExecutor::new(health),
            clients,
        }
    }

    /// Embed one text with fallback
    ///
    /// # Errors
    ///
    /// See [`ModelRoutingExecutor::execute_with_fallback`].
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RoutingError> {
        let targets = self.selector.select_embedding_candidates();
        self.executor
            .execute_with_fallback(
                ModelCapability::Embedding,
                &targets,
                |target: &ModelTarget| self.clients.resolve(target),
                |client: Arc<dyn EmbeddingClient>, target: ModelTarget| async move {
                    client.embed(text, &target).await
                },
            )
            .await
    }

    /// Embed several texts with one candidate
    ///
    /// The whole batch falls back together, so every vector comes from the
    /// same model.
    ///
    /// # Errors
    ///
    /// See [`ModelRoutingExecutor::execute_with_fallback`].
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RoutingError> {
        let targets = self.selector.select_embedding_candidates();
        self.executor
            .execute_with_fallback(
                ModelCapability::Embedding,
                &targets,
                |target: &ModelTarget| self.clients.resolve(target),
                |client: Arc<dyn EmbeddingClient>, target: ModelTarget| async move {
                    client.embed_batch(texts, &target).await
                },
            )
            .await
    }

    /// Dimension of the default embedding model, 0 when unknown
    #[must_use]
    pub fn dimension(&self) -> u32 {
        self.selector
            .select_default_embedding()
            .and_then(|target| target.candidate().dimension)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelCandidate, ProviderConfig};
    use crate::routing::test_utils::{target, MockEmbeddingClient};

    struct EmbeddingOnly(Vec<ModelTarget>);

    impl ModelSelector for EmbeddingOnly {
        fn select_chat_candidates(&self, _thinking: bool) -> Vec<ModelTarget> {
            Vec::new()
        }
        fn select_embedding_candidates(&self) -> Vec<ModelTarget> {
            self.0.clone()
        }
        fn select_rerank_candidates(&self) -> Vec<ModelTarget> {
            Vec::new()
        }
    }

    fn build(targets: Vec<ModelTarget>) -> (RoutingEmbeddingService, Arc<MockEmbeddingClient>) {
        let client = Arc::new(MockEmbeddingClient::new("ollama"));
        let clients = ClientRegistry::from_clients([client.clone() as Arc<dyn EmbeddingClient>]);
        let service = RoutingEmbeddingService::new(
            Arc::new(EmbeddingOnly(targets)),
            Arc::new(ModelHealthStore::default()),
            clients,
        );
        (service, client)
    }

    #[tokio::test]
    async fn test_embed_falls_back() {
        let (service, client) = build(vec![target("a", "ollama"), target("b", "ollama")]);
        client.fail_model("a");

        let vector = service.embed("hello").await.unwrap();

        assert_eq!(vector, vec![2.0]);
        assert_eq!(client.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_batch_uses_single_model() {
        let (service, client) = build(vec![target("a", "ollama"), target("b", "ollama")]);
        client.fail_model("a");
        let texts = vec!["one".to_string(), "two".to_string()];

        let vectors = service.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(client.calls(), vec!["a", "b", "b"]);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let (service, _) = build(Vec::new());
        let err = service.embed("hello").await.unwrap_err();

        assert!(matches!(err, RoutingError::NoCandidates { .. }));
    }

    #[test]
    fn test_dimension() {
        let with_dim = ModelTarget::new(
            ModelCandidate::new("bge", "ollama", "bge-m3").with_dimension(1024),
            ProviderConfig::default(),
        );
        let (service, _) = build(vec![with_dim]);
        assert_eq!(service.dimension(), 1024);

        let (service, _) = build(vec![target("plain", "ollama")]);
        assert_eq!(service.dimension(), 0);

        let (service, _) = build(Vec::new());
        assert_eq!(service.dimension(), 0);
    }
}
