//! Model Client Traits
//!
//! Contracts between the routing services and concrete provider clients. A
//! client speaks one provider's wire protocol for one capability; routing never
//! looks inside a client beyond these traits.
//!
//! # Design Philosophy
//!
//! Every client names the provider it serves through [`ProviderClient`].
//! Routing resolves clients by that name, so several candidates on the same
//! provider share one client instance and receive the [`ModelTarget`] that
//! tells them which model and URL to use.
//!
//! Streaming is push-based: the client delivers events to a
//! [`StreamCallback`] from its own task and hands back a
//! [`StreamCancellationHandle`] that stops delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::routing::target::ModelTarget;

// ============================================================================
// Requests
// ============================================================================

/// Author of a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a conversation
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat request routed to whichever candidate serves it
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0-1.0)
    pub temperature: f32,
    /// Maximum tokens in response (0 = provider default)
    pub max_tokens: u32,
    /// Ask for a thinking trace; restricts routing to thinking-capable models
    pub thinking: bool,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            temperature: 0.7,
            max_tokens: 0,
            thinking: false,
        }
    }
}

impl ChatRequest {
    /// Create a request with a single user message
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            ..Default::default()
        }
    }

    /// Prepend a system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(system));
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request a thinking trace
    #[must_use]
    pub fn with_thinking(mut self, thinking: bool) -> Self {
        self.thinking = thinking;
        self
    }
}

/// A retrieved passage scored by a reranker
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub score: f32,
}

impl RetrievedChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score,
        }
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// Receiver of a streamed chat response
///
/// Implementations are invoked from the provider's delivery task.
pub trait StreamCallback: Send + Sync {
    /// A chunk of answer text
    fn on_content(&self, chunk: &str);

    /// A chunk of thinking trace
    fn on_thinking(&self, chunk: &str) {
        let _ = chunk;
    }

    /// The stream finished normally
    fn on_complete(&self);

    /// The stream failed
    fn on_error(&self, error: anyhow::Error);
}

/// Stop switch for an in-flight stream
///
/// Clients keep a clone of [`Self::token`] and stop emitting once it is
/// cancelled.
#[derive(Clone, Debug, Default)]
pub struct StreamCancellationHandle {
    token: CancellationToken,
}

impl StreamCancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Token the streaming task watches
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Stream events as delivered through a [`ChannelCallback`]
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Content(String),
    Thinking(String),
    Complete,
    Error(String),
}

/// Callback that forwards every event into an unbounded channel
///
/// Useful for transports that drain events on their own task.
#[derive(Clone, Debug)]
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Stream receiver dropped, discarding event");
        }
    }
}

impl StreamCallback for ChannelCallback {
    fn on_content(&self, chunk: &str) {
        self.send(StreamEvent::Content(chunk.to_string()));
    }

    fn on_thinking(&self, chunk: &str) {
        self.send(StreamEvent::Thinking(chunk.to_string()));
    }

    fn on_complete(&self) {
        self.send(StreamEvent::Complete);
    }

    fn on_error(&self, error: anyhow::Error) {
        self.send(StreamEvent::Error(error.to_string()));
    }
}

// ============================================================================
// Client Traits
// ============================================================================

/// Anything registered under a provider name
pub trait ProviderClient: Send + Sync {
    /// Provider name (e.g., "ollama", "bailian")
    fn provider(&self) -> &str;
}

/// Chat completion client for one provider
#[async_trait]
pub trait ChatClient: ProviderClient {
    /// Send a request and wait for the complete answer
    async fn chat(&self, request: &ChatRequest, target: &ModelTarget) -> anyhow::Result<String>;

    /// Start a streamed answer
    ///
    /// Returns once the stream is started; events then arrive on `callback`
    /// from the client's own task until completion, error or cancellation.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        target: &ModelTarget,
        callback: Arc<dyn StreamCallback>,
    ) -> anyhow::Result<StreamCancellationHandle>;
}

/// Embedding client for one provider
#[async_trait]
pub trait EmbeddingClient: ProviderClient {
    async fn embed(&self, text: &str, target: &ModelTarget) -> anyhow::Result<Vec<f32>>;

    /// Embed several texts; the default embeds them one at a time
    async fn embed_batch(
        &self,
        texts: &[String],
        target: &ModelTarget,
    ) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text, target).await?);
        }
        Ok(vectors)
    }
}

/// Rerank client for one provider
#[async_trait]
pub trait RerankClient: ProviderClient {
    /// Reorder `chunks` by relevance to `query`, keeping at most `top_n`
    async fn rerank(
        &self,
        query: &str,
        chunks: &[RetrievedChunk],
        top_n: usize,
        target: &ModelTarget,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;
}
