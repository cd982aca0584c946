//! Ollama HTTP backend.
//!
//! Talks to the native Ollama API (`/api/chat`, `/api/embeddings`,
//! `/api/tags`, `/api/pull`), not the OpenAI-compatible shim.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::backend::{ChatMessage, ChatRequest, LlmBackend};
use crate::error::{LlmError, Result};

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "qwen2.5:14b";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,

    /// Model used for chat.
    pub model: String,

    /// Model used for embeddings; falls back to `model`.
    pub embedding_model: Option<String>,

    /// Overall request timeout.
    pub timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Timeout for model downloads.
    pub pull_timeout: Duration,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Top-k sampling cutoff.
    pub top_k: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pull_timeout: Duration::from_secs(300),
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

impl OllamaConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a separate embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct OllamaPullRequest<'a> {
    name: &'a str,
    stream: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Ollama API backend.
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The backend configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into an error.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LlmError::Status {
            status: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        let body = OllamaChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending Ollama chat request"
        );

        let response = self.client.post(self.url("/api/chat")).json(&body).send().await?;
        let response = Self::check(response).await?;
        let parsed: OllamaChatResponse = response.json().await?;

        tracing::debug!(length = parsed.message.content.len(), "Ollama response received");
        Ok(parsed.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let model = self
            .config
            .embedding_model
            .as_deref()
            .unwrap_or(&self.config.model);
        let body = OllamaEmbeddingRequest {
            model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.url("/api/embeddings"))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(model, "Embedding endpoint not supported by model");
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let parsed: OllamaEmbeddingResponse = response.json().await?;

        if parsed.embedding.is_empty() {
            tracing::warn!(model, "No embedding returned");
            Ok(None)
        } else {
            tracing::debug!(dimensions = parsed.embedding.len(), "Embedding generated");
            Ok(Some(parsed.embedding))
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("/api/tags")).send().await?;
        let response = Self::check(response).await?;
        let parsed: OllamaTagsResponse = response.json().await?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        tracing::info!(model, "Pulling model");
        let response = self
            .client
            .post(self.url("/api/pull"))
            .timeout(self.config.pull_timeout)
            .json(&OllamaPullRequest {
                name: model,
                stream: false,
            })
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!(model, "Model pulled successfully");
        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OllamaBackend {
        let config = OllamaConfig::default()
            .with_base_url(server.uri())
            .with_model("llama3");
        OllamaBackend::new(config).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pull_timeout, Duration::from_secs(300));
        assert_eq!(config.top_k, 40);
    }

    #[tokio::test]
    async fn test_chat_sends_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "hello there"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server)
            .chat(ChatRequest::new("hi").with_system("sys"))
            .await
            .unwrap();
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn test_chat_http_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let err = backend(&server).chat(ChatRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_embed_not_found_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(backend(&server).embed("text").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_embed_returns_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(json!({"model": "llama3", "prompt": "text"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1, 0.2, 0.3]})),
            )
            .mount(&server)
            .await;

        let embedding = backend(&server).embed("text").await.unwrap().unwrap();
        assert_eq!(embedding.len(), 3);
    }

    #[tokio::test]
    async fn test_list_models_and_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "llama3"}, {"name": "mistral"}]
            })))
            .mount(&server)
            .await;

        let backend = backend(&server);
        assert_eq!(backend.list_models().await.unwrap(), vec!["llama3", "mistral"]);
        assert!(backend.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_pull_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_partial_json(json!({"name": "llama3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server).pull_model("llama3").await.unwrap();
    }
}
