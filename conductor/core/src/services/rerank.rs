//! Routed rerank

use std::sync::Arc;

use crate::backend::{ClientRegistry, RerankClient, RetrievedChunk};
use crate::routing::{
    ModelCapability, ModelHealthStore, ModelRoutingExecutor, ModelSelector, ModelTarget,
    RoutingError,
};

pub struct RoutingRerankService {
    selector: Arc<dyn ModelSelector>,
    executor: ModelRoutingExecutor,
    clients: ClientRegistry<dyn RerankClient>,
}

impl RoutingRerankService {
    pub fn new(
        selector: Arc<dyn ModelSelector>,
        health: Arc<ModelHealthStore>,
        clients: ClientRegistry<dyn RerankClient>,
    ) -> Self {
        Self {
            selector,
            executor: ModelRoutingExecutor::new(health),
            clients,
        }
    }

    /// Rerank retrieved chunks for `query`, keeping at most `top_n`
    ///
    /// # Errors
    ///
    /// See [`ModelRoutingExecutor::execute_with_fallback`].
    pub async fn rerank(
        &self,
        query: &str,
        chunks: &[RetrievedChunk],
        top_n: usize,
    ) -> Result<Vec<RetrievedChunk>, RoutingError> {
        let targets = self.selector.select_rerank_candidates();
        self.executor
            .execute_with_fallback(
                ModelCapability::Rerank,
                &targets,
                |target: &ModelTarget| self.clients.resolve(target),
                |client: Arc<dyn RerankClient>, target: ModelTarget| async move {
                    client.rerank(query, chunks, top_n, &target).await
                },
            )
            .await
    }
}
