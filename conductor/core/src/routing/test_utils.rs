//! Routing Test Utilities
//!
//! Scripted mock clients and a recording callback for exercising fallback
//! without real providers.
//!
//! # Usage
//!
//! ```ignore
//! use crate::routing::test_utils::{MockChatClient, RecordingCallback, StreamScript};
//!
//! let client = Arc::new(MockChatClient::new("ollama"));
//! client.script("primary", StreamScript::Error("HTTP 500".into()));
//! client.script("backup", StreamScript::Chunks(vec!["Hel", "lo"]));
//!
//! // After the test, verify which models were called
//! assert_eq!(client.calls(), vec!["primary", "backup"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{
    ChatClient, ChatRequest, EmbeddingClient, ProviderClient, StreamCallback,
    StreamCancellationHandle, StreamEvent,
};
use crate::config::{ModelCandidate, ProviderConfig};
use crate::routing::target::ModelTarget;

/// Build a target with an empty provider section
pub fn target(id: &str, provider: &str) -> ModelTarget {
    ModelTarget::new(
        ModelCandidate::new(id, provider, id),
        ProviderConfig::default(),
    )
}

// ============================================================================
// Recording Callback
// ============================================================================

type ErrorCheck = Box<dyn Fn() -> bool + Send + Sync>;

/// Callback that records everything it receives
#[derive(Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<StreamEvent>>,
    check: Mutex<Option<ErrorCheck>>,
    check_results: Mutex<Vec<bool>>,
}

impl RecordingCallback {
    /// Evaluate `check` whenever `on_error` fires and record the result
    pub fn with_error_check(check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        let callback = Self::default();
        *callback.check.lock().unwrap() = Some(Box::new(check));
        callback
    }

    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn content(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StreamEvent::Content(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn thinking(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StreamEvent::Thinking(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.count(|e| matches!(e, StreamEvent::Complete))
    }

    pub fn errors(&self) -> usize {
        self.count(|e| matches!(e, StreamEvent::Error(_)))
    }

    pub fn check_results(&self) -> Vec<bool> {
        self.check_results.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&StreamEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl StreamCallback for RecordingCallback {
    fn on_content(&self, chunk: &str) {
        self.events
            .lock()
            .unwrap()
            .push(StreamEvent::Content(chunk.to_string()));
    }

    fn on_thinking(&self, chunk: &str) {
        self.events
            .lock()
            .unwrap()
            .push(StreamEvent::Thinking(chunk.to_string()));
    }

    fn on_complete(&self) {
        self.events.lock().unwrap().push(StreamEvent::Complete);
    }

    fn on_error(&self, error: anyhow::Error) {
        if let Some(check) = self.check.lock().unwrap().as_ref() {
            self.check_results.lock().unwrap().push(check());
        }
        self.events
            .lock()
            .unwrap()
            .push(StreamEvent::Error(error.to_string()));
    }
}

// ============================================================================
// Mock Chat Client
// ============================================================================

/// Scripted behaviour of one model's stream
#[derive(Clone, Debug)]
pub enum StreamScript {
    /// Emit the chunks then complete
    Chunks(Vec<&'static str>),
    /// Emit thinking chunks, then content chunks, then complete
    ThinkingThenChunks(Vec<&'static str>, Vec<&'static str>),
    /// Wait, then emit the chunks and complete
    Delayed(Duration, Vec<&'static str>),
    /// Report an error before any content
    Error(String),
    /// Complete without content
    Empty,
    /// Never call back
    Silent,
    /// Fail to start the stream at all
    FailToStart(String),
    /// Wait, then emit the chunks and complete even if cancelled
    IgnoreCancel(Duration, Vec<&'static str>),
}

/// Chat client whose behaviour is scripted per model id
pub struct MockChatClient {
    provider: String,
    scripts: Mutex<HashMap<String, StreamScript>>,
    calls: Mutex<Vec<String>>,
    handles: Mutex<Vec<(String, StreamCancellationHandle)>>,
}

impl MockChatClient {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, model_id: &str, script: StreamScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(model_id.to_string(), script);
    }

    /// Model ids called, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Handles returned so far, with their model ids
    pub fn handles(&self) -> Vec<(String, StreamCancellationHandle)> {
        self.handles.lock().unwrap().clone()
    }

    pub fn all_handles_cancelled(&self) -> bool {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .all(|(_, h)| h.is_cancelled())
    }

    fn script_for(&self, model_id: &str) -> StreamScript {
        self.scripts
            .lock()
            .unwrap()
            .get(model_id)
            .cloned()
            .unwrap_or(StreamScript::Chunks(vec!["ok"]))
    }
}

impl ProviderClient for MockChatClient {
    fn provider(&self) -> &str {
        &self.provider
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, _request: &ChatRequest, target: &ModelTarget) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(target.id().to_string());
        match self.script_for(target.id()) {
            StreamScript::Chunks(chunks)
            | StreamScript::Delayed(_, chunks)
            | StreamScript::ThinkingThenChunks(_, chunks)
            | StreamScript::IgnoreCancel(_, chunks) => Ok(chunks.concat()),
            StreamScript::Error(msg) | StreamScript::FailToStart(msg) => Err(anyhow::anyhow!(msg)),
            StreamScript::Empty | StreamScript::Silent => {
                Err(anyhow::anyhow!("empty response from {}", target.id()))
            }
        }
    }

    async fn stream_chat(
        &self,
        _request: &ChatRequest,
        target: &ModelTarget,
        callback: Arc<dyn StreamCallback>,
    ) -> anyhow::Result<StreamCancellationHandle> {
        let id = target.id().to_string();
        self.calls.lock().unwrap().push(id.clone());

        let script = self.script_for(&id);
        if let StreamScript::FailToStart(msg) = &script {
            return Err(anyhow::anyhow!(msg.clone()));
        }

        let handle = StreamCancellationHandle::new();
        self.handles
            .lock()
            .unwrap()
            .push((id, handle.clone()));

        let token = handle.token();
        tokio::spawn(async move {
            let emit = |chunks: &[&str], thinking: bool| {
                for chunk in chunks {
                    if token.is_cancelled() {
                        return false;
                    }
                    if thinking {
                        callback.on_thinking(chunk);
                    } else {
                        callback.on_content(chunk);
                    }
                }
                true
            };

            match script {
                StreamScript::Chunks(chunks) => {
                    if emit(&chunks[..], false) {
                        callback.on_complete();
                    }
                }
                StreamScript::ThinkingThenChunks(thinking, chunks) => {
                    if emit(&thinking[..], true) && emit(&chunks[..], false) {
                        callback.on_complete();
                    }
                }
                StreamScript::Delayed(delay, chunks) => {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            if emit(&chunks[..], false) {
                                callback.on_complete();
                            }
                        }
                    }
                }
                StreamScript::IgnoreCancel(delay, chunks) => {
                    tokio::time::sleep(delay).await;
                    for chunk in chunks {
                        callback.on_content(chunk);
                    }
                    callback.on_complete();
                }
                StreamScript::Error(msg) => callback.on_error(anyhow::anyhow!(msg)),
                StreamScript::Empty => callback.on_complete(),
                StreamScript::Silent => token.cancelled().await,
                StreamScript::FailToStart(_) => {}
            }
        });

        Ok(handle)
    }
}

// ============================================================================
// Mock Embedding Client
// ============================================================================

/// Embedding client returning `[n]` for its n-th call
pub struct MockEmbeddingClient {
    provider: String,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockEmbeddingClient {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_model(&self, model_id: &str) {
        self.failing.lock().unwrap().insert(model_id.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Synchronous body shared by the trait impl and executor tests
    pub fn embed_for(&self, target: &ModelTarget) -> anyhow::Result<Vec<f32>> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(target.id().to_string());
        if self.failing.lock().unwrap().contains(target.id()) {
            anyhow::bail!("embedding failed for {}", target.id());
        }
        Ok(vec![calls.len() as f32])
    }
}

impl ProviderClient for MockEmbeddingClient {
    fn provider(&self) -> &str {
        &self.provider
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, _text: &str, target: &ModelTarget) -> anyhow::Result<Vec<f32>> {
        self.embed_for(target)
    }
}
