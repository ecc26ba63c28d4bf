//! Routed chat
//!
//! Plain chat goes through the generic executor. Streaming chat runs its own
//! loop because a candidate's success is only known once its first packet
//! arrives, and anything forwarded by then is irreversible.
//!
//! # Streaming Protocol
//!
//! For each candidate in order:
//!
//! 1. Wrap the caller's callback in a [`GatedCallback`] bound to a fresh
//!    [`FirstPacketAwaiter`] and start the stream.
//! 2. Wait for the first packet, bounded by `first_packet_timeout`.
//! 3. Content: the candidate is committed and its handle returned.
//! 4. Timeout, empty completion or error: the candidate is marked failed, its
//!    gate abandoned and its stream cancelled, then the next one is tried.
//!
//! The caller's `on_error` fires at most once: when every candidate has been
//! exhausted, or when the caller cancels during a wait.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{ChatClient, ChatRequest, ClientRegistry, StreamCallback, StreamCancellationHandle};
use crate::routing::{
    ModelCapability, ModelHealthStore, ModelRoutingExecutor, ModelSelector, ModelTarget,
    RoutingError,
};
use crate::streaming::{FirstPacket, FirstPacketAwaiter, GatedCallback, Interrupted};

/// Default bound on time-to-first-packet per candidate
pub const DEFAULT_FIRST_PACKET_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat over ordered fallback candidates
pub struct RoutingChatService {
    selector: Arc<dyn ModelSelector>,
    executor: ModelRoutingExecutor,
    clients: ClientRegistry<dyn ChatClient>,
    first_packet_timeout: Duration,
}

impl RoutingChatService {
    pub fn new(
        selector: Arc<dyn ModelSelector>,
        health: Arc<ModelHealthStore>,
        clients: ClientRegistry<dyn ChatClient>,
    ) -> Self {
        Self {
            selector,
            executor: ModelRoutingExecutor::new(health),
            clients,
            first_packet_timeout: DEFAULT_FIRST_PACKET_TIMEOUT,
        }
    }

    /// Override the per-candidate first-packet bound
    #[must_use]
    pub fn with_first_packet_timeout(mut self, timeout: Duration) -> Self {
        self.first_packet_timeout = timeout;
        self
    }

    #[must_use]
    pub fn first_packet_timeout(&self) -> Duration {
        self.first_packet_timeout
    }

    fn health(&self) -> &ModelHealthStore {
        self.executor.health()
    }

    /// Non-streaming chat with fallback
    ///
    /// # Errors
    ///
    /// See [`ModelRoutingExecutor::execute_with_fallback`].
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, RoutingError> {
        let targets = self.selector.select_chat_candidates(request.thinking);
        self.executor
            .execute_with_fallback(
                ModelCapability::Chat,
                &targets,
                |target: &ModelTarget| self.clients.resolve(target),
                |client: Arc<dyn ChatClient>, target: ModelTarget| async move {
                    client.chat(request, &target).await
                },
            )
            .await
    }

    /// Streaming chat with first-packet gated fallback
    ///
    /// On success the returned handle belongs to the committed candidate; its
    /// stream keeps delivering to `callback` on its own task.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::NoProvider`] if there are no chat candidates
    /// - [`RoutingError::StreamInterrupted`] if `cancel` fires during a wait
    /// - [`RoutingError::StreamExhausted`] once every candidate failed
    ///
    /// The last two are also delivered to `callback.on_error`, exactly once.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        callback: Arc<dyn StreamCallback>,
        cancel: &CancellationToken,
    ) -> Result<StreamCancellationHandle, RoutingError> {
        let targets = self.selector.select_chat_candidates(request.thinking);
        if targets.is_empty() {
            return Err(RoutingError::NoProvider);
        }

        let mut last_error: Option<anyhow::Error> = None;

        for target in &targets {
            let Some(client) = self.clients.resolve(target) else {
                tracing::warn!(
                    model = %target.id(),
                    provider = %target.provider_name(),
                    "No chat client registered for provider, skipping candidate"
                );
                continue;
            };

            let attempt = Uuid::new_v4();
            let awaiter = FirstPacketAwaiter::new();
            let gate = Arc::new(GatedCallback::new(
                callback.clone(),
                awaiter.signal(),
                target.id(),
            ));

            tracing::debug!(model = %target.id(), %attempt, "Starting streaming attempt");

            let handle = match client.stream_chat(request, target, gate.clone()).await {
                Ok(handle) => handle,
                Err(e) => {
                    self.health().mark_failure(target.id());
                    gate.abandon();
                    tracing::warn!(
                        model = %target.id(),
                        %attempt,
                        error = %e,
                        "Failed to start stream, trying next candidate"
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            let guard = AttemptGuard::new(&handle, &gate);
            let waited = awaiter.wait(self.first_packet_timeout, cancel).await;
            guard.disarm();

            let outcome = match waited {
                Ok(outcome) => outcome,
                Err(Interrupted) => {
                    handle.cancel();
                    gate.abandon();
                    tracing::info!(model = %target.id(), %attempt, "Streaming request cancelled by caller");
                    callback.on_error(RoutingError::StreamInterrupted.into());
                    return Err(RoutingError::StreamInterrupted);
                }
            };

            let cause = match outcome {
                FirstPacket::Content => {
                    self.health().mark_success(target.id());
                    tracing::info!(model = %target.id(), %attempt, "Streaming candidate committed");
                    return Ok(handle);
                }
                FirstPacket::Timeout => anyhow::anyhow!(
                    "no first packet from {} within {:?}",
                    target.id(),
                    self.first_packet_timeout
                ),
                FirstPacket::NoContent => {
                    anyhow::anyhow!("{} completed without content", target.id())
                }
                FirstPacket::Error(e) => e,
            };

            if !gate.abandon() {
                // A chunk reached the caller as the wait ended.
                self.health().mark_success(target.id());
                tracing::info!(
                    model = %target.id(),
                    %attempt,
                    "First chunk raced the wait, keeping candidate"
                );
                return Ok(handle);
            }

            self.health().mark_failure(target.id());
            handle.cancel();
            tracing::warn!(
                model = %target.id(),
                %attempt,
                error = %cause,
                "Streaming candidate failed, trying next candidate"
            );
            last_error = Some(cause);
        }

        tracing::error!(
            candidates = targets.len(),
            "All streaming chat candidates failed"
        );
        callback.on_error(RoutingError::StreamExhausted { last_error: None }.into());
        Err(RoutingError::StreamExhausted { last_error })
    }
}

/// Tears down an attempt if the routing future is dropped mid-wait
///
/// Cancelling the handle alone is not enough: a provider may keep calling
/// back after cancellation, so the gate is detached as well.
struct AttemptGuard<'a> {
    handle: &'a StreamCancellationHandle,
    gate: &'a GatedCallback,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(handle: &'a StreamCancellationHandle, gate: &'a GatedCallback) -> Self {
        Self {
            handle,
            gate,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.handle.cancel();
            self.gate.abandon();
        }
    }
}
