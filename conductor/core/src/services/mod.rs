//! Capability services
//!
//! Each service pairs a [`ModelSelector`](crate::routing::ModelSelector) with
//! a client registry and routes requests through the shared health store.

mod chat;
mod embedding;
mod rerank;

pub use chat::{RoutingChatService, DEFAULT_FIRST_PACKET_TIMEOUT};
pub use embedding::RoutingEmbeddingService;
pub use rerank::RoutingRerankService;
