//! LLM backend trait and the mock implementation.
//!
//! A backend is a thin transport: it sends one chat exchange and returns the
//! raw text. Prompting, parsing and degradation live in [`crate::Gateway`].

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single non-streaming chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A request with one user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    /// Prepend a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(system));
        self
    }

    /// The system prompt, if any.
    pub fn system(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// The last user message.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for text-generation backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a chat request and return the assistant's text.
    async fn chat(&self, request: ChatRequest) -> Result<String>;

    /// Embed text. `Ok(None)` means the backend or model does not support it.
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>>;

    /// Names of models available on the backend.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Download a model onto the backend.
    async fn pull_model(&self, model: &str) -> Result<()>;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// The model used for chat requests.
    fn model(&self) -> &str;

    /// Check the backend is reachable and the model is available.
    async fn health_check(&self) -> Result<()> {
        let models = self.list_models().await?;
        if models.iter().any(|m| m == self.model()) {
            Ok(())
        } else {
            Err(LlmError::ModelNotFound(self.model().to_string()))
        }
    }
}

/// A backend that can be shared across tasks.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A canned reply from [`MockBackend`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail as if the request timed out.
    Timeout,
    /// Fail with an HTTP status.
    Status(u16),
}

impl MockReply {
    fn into_result(self) -> Result<String> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Timeout => Err(LlmError::Timeout("mock timeout".to_string())),
            MockReply::Status(status) => Err(LlmError::Status {
                status,
                message: "mock status".to_string(),
            }),
        }
    }
}

/// A mock backend for testing.
///
/// Replies are chosen in this order:
/// 1. the first rule whose needle occurs in the system prompt,
/// 2. the next queued reply,
/// 3. the fallback reply, if set,
/// 4. otherwise an error.
pub struct MockBackend {
    name: String,
    model: String,
    rules: Mutex<Vec<(String, MockReply)>>,
    queue: Mutex<VecDeque<MockReply>>,
    fallback: Option<MockReply>,
    embedding: Option<Vec<f32>>,
    models: Vec<String>,
    request_log: Mutex<Vec<ChatRequest>>,
    pulled: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create an empty mock. Every chat call fails until replies are added.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            model: "mock-model".to_string(),
            rules: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            embedding: None,
            models: vec!["mock-model".to_string()],
            request_log: Mutex::new(Vec::new()),
            pulled: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns the given texts in order.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        backend
            .queue
            .lock()
            .extend(texts.into_iter().map(|t| MockReply::Text(t.into())));
        backend
    }

    /// Reply with `reply` whenever the system prompt contains `needle`.
    pub fn on_system(self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.lock().push((needle.into(), reply));
        self
    }

    /// Reply used when no rule matches and the queue is empty.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Embedding returned for every text.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Models reported by `list_models`.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Queue another reply.
    pub fn push(&self, reply: MockReply) {
        self.queue.lock().push_back(reply);
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }

    /// Models pulled through `pull_model`.
    pub fn pulled(&self) -> Vec<String> {
        self.pulled.lock().clone()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        let system = request.system().unwrap_or_default().to_string();
        self.request_log.lock().push(request);

        let ruled = self
            .rules
            .lock()
            .iter()
            .find(|(needle, _)| system.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());
        if let Some(reply) = ruled {
            return reply.into_result();
        }

        if let Some(reply) = self.queue.lock().pop_front() {
            return reply.into_result();
        }

        match &self.fallback {
            Some(reply) => reply.clone().into_result(),
            None => Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            )),
        }
    }

    async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.embedding.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        self.pulled.lock().push(model.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}
