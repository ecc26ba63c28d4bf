//! Model Client Integration
//!
//! Provider-agnostic client contracts for the three routed capabilities.
//! Concrete HTTP clients live outside this crate and plug in through the
//! traits below.
//!
//! # Usage
//!
//! ```ignore
//! use routing_core::backend::{ChatClient, ClientRegistry, NoopRerankClient, RerankClient};
//!
//! let mut chat: ClientRegistry<dyn ChatClient> = ClientRegistry::new();
//! chat.register(Arc::new(MyOllamaClient::new()));
//!
//! let rerank: ClientRegistry<dyn RerankClient> =
//!     ClientRegistry::from_clients([Arc::new(NoopRerankClient) as Arc<dyn RerankClient>]);
//! ```

mod error;
mod noop;
mod registry;
mod traits;

pub use error::{ModelClientError, ModelClientErrorKind};
pub use noop::{NoopRerankClient, NOOP_PROVIDER};
pub use registry::ClientRegistry;
pub use traits::{
    ChannelCallback, ChatClient, ChatMessage, ChatRequest, ChatRole, EmbeddingClient,
    ProviderClient, RerankClient, RetrievedChunk, StreamCallback, StreamCancellationHandle,
    StreamEvent,
};
