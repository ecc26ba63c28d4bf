//! Pass-through reranker
//!
//! Registered under the `noop` provider for deployments without a rerank
//! model. Keeps retrieval order and only truncates.

use async_trait::async_trait;

use super::traits::{ProviderClient, RerankClient, RetrievedChunk};
use crate::routing::target::ModelTarget;

/// Provider name served by [`NoopRerankClient`]
pub const NOOP_PROVIDER: &str = "noop";

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRerankClient;

impl ProviderClient for NoopRerankClient {
    fn provider(&self) -> &str {
        NOOP_PROVIDER
    }
}

#[async_trait]
impl RerankClient for NoopRerankClient {
    async fn rerank(
        &self,
        _query: &str,
        chunks: &[RetrievedChunk],
        top_n: usize,
        _target: &ModelTarget,
    ) -> anyhow::Result<Vec<RetrievedChunk>> {
        if top_n == 0 || chunks.len() <= top_n {
            return Ok(chunks.to_vec());
        }
        Ok(chunks[..top_n].to_vec())
    }
}
