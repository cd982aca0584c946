//! The language-model gateway.
//!
//! Every operation fails soft: backend errors are logged and replaced with
//! a safe default, reported through [`Outcome::Degraded`] so callers can
//! still tell a real answer from a fallback.

use docket_types::{Category, Outcome};
use tracing::{error, info, warn};

use crate::backend::{ChatRequest, SharedBackend};
use crate::error::{LlmError, Result};
use crate::extraction::{ActionItemCandidate, parse_action_items};
use crate::prompts;

/// Reply when the backend timed out.
pub const TIMEOUT_APOLOGY: &str =
    "I'm sorry, the response took too long to generate. Please try a shorter request.";

/// Reply when the backend returned an HTTP error.
pub const HTTP_APOLOGY: &str = "I'm experiencing technical difficulties. Please try again later.";

/// Reply for any other backend failure.
pub const GENERIC_APOLOGY: &str =
    "I'm sorry, I'm having trouble generating a response right now. Please try again later.";

/// High-level operations over an [`LlmBackend`](crate::LlmBackend).
#[derive(Clone)]
pub struct Gateway {
    backend: SharedBackend,
}

impl Gateway {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Send a prompt; on failure return a user-facing apology.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Outcome<String> {
        let mut request = ChatRequest::new(prompt);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        match self.backend.chat(request).await {
            Ok(text) => Outcome::Fresh(text),
            Err(e) => {
                error!(backend = self.backend.name(), error = %e, "Error generating response");
                Outcome::degraded(apology_for(&e).to_string(), e.to_string())
            }
        }
    }

    /// Suggest a short meeting title. The text is stripped of quotes but not
    /// length-checked; that is the caller's job.
    pub async fn title(&self, content: &str) -> Outcome<String> {
        self.generate(&prompts::title_prompt(content), Some(prompts::TITLE_SYSTEM))
            .await
            .map(|t| t.trim().trim_matches(|c: char| c == '"' || c == '\'').trim().to_string())
    }

    /// Classify meeting content. Unknown answers become `Other`.
    pub async fn categorize(&self, content: &str) -> Outcome<Category> {
        match self
            .generate(&prompts::category_prompt(content), Some(prompts::CATEGORY_SYSTEM))
            .await
        {
            Outcome::Fresh(raw) => {
                let answer = raw.trim().to_lowercase();
                match answer.parse::<Category>() {
                    Ok(category) => {
                        info!(category = %category, "Meeting categorized");
                        Outcome::Fresh(category)
                    }
                    Err(_) => {
                        warn!(category = %answer, "Invalid category returned");
                        Outcome::Fresh(Category::Other)
                    }
                }
            }
            Outcome::Degraded { reason, .. } => Outcome::degraded(Category::Other, reason),
        }
    }

    /// Extract action items. Malformed output yields an empty list.
    pub async fn extract_action_items(&self, content: &str) -> Outcome<Vec<ActionItemCandidate>> {
        match self
            .generate(
                &prompts::action_items_prompt(content),
                Some(prompts::ACTION_ITEMS_SYSTEM),
            )
            .await
        {
            Outcome::Fresh(raw) => {
                let items = parse_action_items(&raw);
                info!(count = items.len(), "Action items extracted");
                Outcome::Fresh(items)
            }
            Outcome::Degraded { reason, .. } => Outcome::degraded(Vec::new(), reason),
        }
    }

    /// Summarize meeting content.
    pub async fn summarize(&self, content: &str) -> Outcome<String> {
        let summary = self
            .generate(&prompts::summary_prompt(content), Some(prompts::SUMMARY_SYSTEM))
            .await;
        if !summary.is_degraded() {
            info!(length = summary.value().len(), "Meeting summary generated");
        }
        summary
    }

    /// Embed text. An empty vector means no embedding is available.
    pub async fn embed(&self, text: &str) -> Outcome<Vec<f32>> {
        match self.backend.embed(text).await {
            Ok(Some(embedding)) => Outcome::Fresh(embedding),
            Ok(None) => Outcome::Fresh(Vec::new()),
            Err(e) => {
                warn!(error = %e, "Error generating embedding");
                Outcome::degraded(Vec::new(), e.to_string())
            }
        }
    }

    /// Answer a question from supplied context.
    pub async fn answer_with_context(&self, question: &str, context: &str) -> Outcome<String> {
        let answer = self
            .generate(
                &prompts::answer_prompt(question, context),
                Some(prompts::ANSWER_SYSTEM),
            )
            .await;
        if !answer.is_degraded() {
            info!("Question answered with context");
        }
        answer
    }

    /// Make sure the configured model is present, pulling it if not.
    pub async fn ensure_model(&self) -> Result<()> {
        let model = self.backend.model().to_string();
        let available = self.backend.list_models().await?;
        if available.iter().any(|m| *m == model) {
            info!(model = %model, "Model verified");
            return Ok(());
        }

        warn!(model = %model, available = ?available, "Model not found in available models");
        self.backend.pull_model(&model).await
    }

    /// Backend health.
    pub async fn health_check(&self) -> Result<()> {
        self.backend.health_check().await
    }
}

fn apology_for(err: &LlmError) -> &'static str {
    match err {
        LlmError::Timeout(_) => TIMEOUT_APOLOGY,
        LlmError::Status { .. } => HTTP_APOLOGY,
        _ => GENERIC_APOLOGY,
    }
}
