//! Routing Core - Resilient model routing for ai-way
//!
//! Lets a RAG service call interchangeable model providers for chat,
//! embedding and rerank with ordered failover and per-model circuit breaking,
//! including streamed answers that are already flowing to a client.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Services                                 │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌────────────────────┐  │
//! │  │ RoutingChat  │  │ RoutingEmbedding │  │   RoutingRerank    │  │
//! │  └──────┬───────┘  └────────┬─────────┘  └─────────┬──────────┘  │
//! │         │ streaming         │                      │             │
//! │  ┌──────┴───────┐           │                      │             │
//! │  │ GatedCallback│           │                      │             │
//! │  │ FirstPacket  │           │                      │             │
//! │  └──────┬───────┘           │                      │             │
//! │         └──────────┬────────┴──────────────────────┘             │
//! │                    v                                             │
//! │  ┌────────────────────────────┐    ┌──────────────────────────┐  │
//! │  │   ModelRoutingExecutor     │───>│    ModelHealthStore      │  │
//! │  └─────────────┬──────────────┘    └──────────────────────────┘  │
//! │                v                                                 │
//! │  ┌────────────────────────────┐                                  │
//! │  │ ClientRegistry<dyn Client> │  <-- provider HTTP clients       │
//! │  └────────────────────────────┘                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ModelHealthStore`]: Per-model circuit breaker, shared and injected
//! - [`ModelRoutingExecutor`]: Generic ordered fallback
//! - [`FirstPacketAwaiter`]: Bounded, cancellable first-packet wait
//! - [`RoutingChatService`]: Chat and gated streaming chat
//!
//! # Quick Start
//!
//! ```ignore
//! use routing_core::{
//!     backend::{ChatClient, ClientRegistry, ChatRequest},
//!     config::load_config,
//!     routing::{ConfiguredSelector, ModelHealthStore},
//!     services::RoutingChatService,
//! };
//!
//! let config = Arc::new(load_config()?);
//! let health = Arc::new(ModelHealthStore::new(config.health_config()));
//! let selector = Arc::new(ConfiguredSelector::new(config.clone()));
//!
//! let mut clients: ClientRegistry<dyn ChatClient> = ClientRegistry::new();
//! clients.register(Arc::new(MyOllamaClient::new()));
//!
//! let chat = RoutingChatService::new(selector, health, clients)
//!     .with_first_packet_timeout(config.first_packet_timeout());
//!
//! let handle = chat.stream_chat(&ChatRequest::new("Hello"), callback, &cancel).await?;
//! ```

pub mod backend;
pub mod config;
pub mod routing;
pub mod services;
pub mod streaming;

pub use backend::{ChatClient, ChatRequest, StreamCallback, StreamCancellationHandle};
pub use config::{load_config, RoutingConfig};
pub use routing::{ModelHealthStore, ModelRoutingExecutor, RoutingError};
pub use services::{RoutingChatService, RoutingEmbeddingService, RoutingRerankService};
pub use streaming::{FirstPacketAwaiter, GatedCallback};
