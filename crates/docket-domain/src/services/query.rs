//! Question answering over stored meetings.

use docket_index::{IndexHit, QueryInput};
use serde::Serialize;
use tracing::info;

use super::Services;

/// An answer and the meetings it drew on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<IndexHit>,
    /// The model call or the search fell back to a default.
    pub degraded: bool,
}

/// Answers free-text questions from meeting context.
#[derive(Clone)]
pub struct QueryService {
    services: Services,
}

impl QueryService {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Retrieve the closest meetings and answer from them.
    ///
    /// Always produces text: an apology when the model is unavailable, and
    /// a no-context prompt when nothing relevant is stored.
    pub async fn answer(&self, question: &str) -> Answer {
        let gateway = self.services.gateway();
        let index = self.services.index();
        info!(query = %docket_llm::prompts::head(question, 100), "Processing query");

        let embedding = gateway.embed(question).await;
        let input = QueryInput::best(question, embedding.into_value());
        let context = index
            .context_for(input, self.services.config().context_results)
            .await;
        let search_degraded = context.is_degraded();
        let context = context.into_value();

        let answer = gateway.answer_with_context(question, &context.text).await;

        Answer {
            degraded: search_degraded || answer.is_degraded(),
            text: answer.into_value(),
            sources: context.sources,
        }
    }
}
