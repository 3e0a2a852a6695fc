//! In-memory `ChatBackend` for tests: replays scripted replies in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{ChatBackend, ChatMessage, LlmError, ModelGateway, RetryPolicy};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Pops one scripted reply per call. Once the script runs out every call
/// fails with `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Concatenated content of every message in the n-th request.
    pub fn prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            temperature,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

/// Delegates to a `ScriptedBackend`. After `hold`, the next call signals
/// `entered` and then parks until `release`.
pub struct GatedBackend {
    inner: Arc<ScriptedBackend>,
    holding: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl GatedBackend {
    pub fn new(inner: Arc<ScriptedBackend>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            holding: AtomicBool::new(false),
            entered: Notify::new(),
            released: Notify::new(),
        })
    }

    pub fn hold(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl ChatBackend for GatedBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        if self.holding.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        self.inner.complete(messages, temperature).await
    }
}

/// Default attempt budget with every wait set to zero.
pub fn instant_policy() -> RetryPolicy {
    RetryPolicy {
        min_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
        rate_limit_pause: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub fn scripted_gateway(backend: &Arc<ScriptedBackend>) -> ModelGateway {
    ModelGateway::new(backend.clone(), instant_policy())
}
