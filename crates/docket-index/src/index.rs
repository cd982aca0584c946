//! The semantic index facade.

use std::sync::Arc;

use docket_types::Outcome;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::backend::IndexBackend;
use crate::error::Result;
use crate::types::{EntryKind, IndexDocument, IndexHit, Metadata, QueryInput};

/// Returned by [`SemanticIndex::context_for`] when nothing matches.
pub const NO_CONTEXT: &str = "No relevant meeting context found.";

/// Default number of meetings pulled into question context.
pub const DEFAULT_CONTEXT_RESULTS: usize = 3;

/// Default characters kept per context snippet.
pub const DEFAULT_SNIPPET_CHARS: usize = 500;

/// Formatted question context and the meetings it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingContext {
    /// Prompt-ready text, [`NO_CONTEXT`] when nothing matched.
    pub text: String,
    pub sources: Vec<IndexHit>,
}

/// Stores entity text by kind and answers similarity queries.
///
/// Writes propagate errors: losing an index entry silently would leave the
/// record unsearchable. Reads degrade to an empty result.
#[derive(Clone)]
pub struct SemanticIndex {
    backend: Arc<dyn IndexBackend>,
    snippet_chars: usize,
}

impl SemanticIndex {
    pub fn new(backend: Arc<dyn IndexBackend>) -> Self {
        Self {
            backend,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    /// Characters kept from each document in `context_for`.
    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    pub fn backend(&self) -> &Arc<dyn IndexBackend> {
        &self.backend
    }

    pub fn snippet_chars(&self) -> usize {
        self.snippet_chars
    }

    /// Store `text` for an entity and return the new index id.
    ///
    /// The id is `{kind}_{entity_id}_{8 hex chars}`, so indexing the same
    /// entity twice yields two distinct entries.
    pub async fn index(
        &self,
        kind: EntryKind,
        entity_id: i64,
        text: &str,
        mut metadata: Metadata,
        embedding: Option<Vec<f32>>,
    ) -> Result<String> {
        let id = entry_id(kind, entity_id);
        metadata.insert("kind".to_string(), json!(kind.as_str()));
        metadata.insert("entity_id".to_string(), json!(entity_id));

        let document = IndexDocument {
            id: id.clone(),
            document: text.to_string(),
            metadata,
            embedding: embedding.filter(|e| !e.is_empty()),
        };

        match self.backend.upsert(kind.collection(), vec![document]).await {
            Ok(()) => {
                info!(vector_id = %id, kind = %kind, "Stored in semantic index");
                Ok(id)
            }
            Err(e) => {
                error!(kind = %kind, entity_id, error = %e, "Failed to store in semantic index");
                Err(e)
            }
        }
    }

    /// Nearest-neighbour search within one kind.
    pub async fn query(
        &self,
        kind: EntryKind,
        input: impl Into<QueryInput>,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Outcome<Vec<IndexHit>> {
        let input = input.into();
        match self.backend.query(kind.collection(), &input, k, filter).await {
            Ok(hits) => {
                info!(kind = %kind, count = hits.len(), "Found similar entries");
                Outcome::Fresh(hits)
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Semantic search failed");
                Outcome::degraded(Vec::new(), e.to_string())
            }
        }
    }

    /// Similar entries of a kind, ignoring whether the search degraded.
    pub async fn search(&self, kind: EntryKind, input: impl Into<QueryInput>, k: usize) -> Vec<IndexHit> {
        self.query(kind, input, k, None).await.into_value()
    }

    /// Format the `k` closest meetings as prompt context.
    ///
    /// The text is never empty: with no matches it is [`NO_CONTEXT`]. A
    /// failed search degrades to that sentinel.
    pub async fn context_for(
        &self,
        input: impl Into<QueryInput>,
        k: usize,
    ) -> Outcome<MeetingContext> {
        let snippet_chars = self.snippet_chars;
        self.query(EntryKind::Meeting, input, k, None)
            .await
            .map(|sources| MeetingContext {
                text: format_context(&sources, snippet_chars),
                sources,
            })
    }

    /// Check the backend is reachable.
    pub async fn heartbeat(&self) -> Result<()> {
        self.backend.heartbeat().await
    }
}

fn entry_id(kind: EntryKind, entity_id: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", kind.as_str(), entity_id, &suffix[..8])
}

/// Render hits as numbered meeting snippets.
pub fn format_context(hits: &[IndexHit], snippet_chars: usize) -> String {
    if hits.is_empty() {
        return NO_CONTEXT.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut content: String = hit.document.chars().take(snippet_chars).collect();
            if hit.document.chars().count() > snippet_chars {
                content.push_str("...");
            }
            match hit.metadata.get("category").and_then(Value::as_str) {
                Some(category) => format!("Meeting {} ({}):\n{}", i + 1, category, content),
                None => format!("Meeting {}:\n{}", i + 1, content),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIndexBackend;

    fn index() -> (SemanticIndex, Arc<MemoryIndexBackend>) {
        let backend = Arc::new(MemoryIndexBackend::new());
        (SemanticIndex::new(backend.clone()), backend)
    }

    fn category(c: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), json!(c));
        metadata
    }

    #[tokio::test]
    async fn test_index_ids_are_unique_per_call() {
        let (index, backend) = index();
        let a = index
            .index(EntryKind::Meeting, 7, "same text", Metadata::new(), None)
            .await
            .unwrap();
        let b = index
            .index(EntryKind::Meeting, 7, "same text", Metadata::new(), None)
            .await
            .unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("meeting_7_"));
        assert_eq!(a.len(), "meeting_7_".len() + 8);
        assert_eq!(backend.len("meetings"), 2);
    }

    #[tokio::test]
    async fn test_index_failure_propagates() {
        let (index, backend) = index();
        backend.set_unavailable(true);
        let result = index
            .index(EntryKind::ActionItem, 1, "x", Metadata::new(), None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_query_failure_degrades_to_empty() {
        let (index, backend) = index();
        backend.set_unavailable(true);
        let hits = index.query(EntryKind::Meeting, "budget", 3, None).await;
        assert!(hits.is_degraded());
        assert!(hits.value().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_finds_own_content() {
        let (index, _) = index();
        let content = "Quarterly budget review. Action items: send report to finance by Friday.";
        let id = index
            .index(EntryKind::Meeting, 1, content, category("work"), None)
            .await
            .unwrap();
        index
            .index(EntryKind::Meeting, 2, "Dentist appointment on Tuesday", category("health"), None)
            .await
            .unwrap();

        let hits = index.search(EntryKind::Meeting, content, 3).await;
        assert!(hits.iter().take(1).any(|h| h.id == id));
        assert_eq!(hits[0].metadata["kind"], "meeting");
        assert_eq!(hits[0].metadata["entity_id"], 1);
    }

    #[tokio::test]
    async fn test_context_for_sentinel_when_empty() {
        let (index, _) = index();
        let context = index.context_for("anything", 3).await;
        assert!(!context.is_degraded());
        assert_eq!(context.value().text, NO_CONTEXT);
        assert!(context.value().sources.is_empty());
    }

    #[tokio::test]
    async fn test_context_for_formats_and_truncates() {
        let (index, _) = index();
        let long = format!("budget {}", "x".repeat(600));
        index
            .index(EntryKind::Meeting, 1, &long, category("finance"), None)
            .await
            .unwrap();

        let context = index.context_for("budget", 3).await.into_value();
        assert_eq!(context.sources.len(), 1);
        let context = context.text;
        assert!(context.starts_with("Meeting 1 (finance):\n"));
        assert!(context.ends_with("..."));
        let body = context.trim_start_matches("Meeting 1 (finance):\n");
        assert_eq!(body.chars().count(), DEFAULT_SNIPPET_CHARS + 3);
    }

    #[tokio::test]
    async fn test_context_for_degrades_to_sentinel() {
        let (index, backend) = index();
        backend.set_unavailable(true);
        let context = index.context_for("budget", 3).await;
        assert!(context.is_degraded());
        assert_eq!(context.into_value().text, NO_CONTEXT);
    }

    #[test]
    fn test_format_context_without_category() {
        let hits = vec![
            IndexHit {
                id: "a".into(),
                document: "one".into(),
                metadata: Metadata::new(),
                distance: 0.1,
            },
            IndexHit {
                id: "b".into(),
                document: "two".into(),
                metadata: category("work"),
                distance: 0.2,
            },
        ];
        assert_eq!(
            format_context(&hits, 500),
            "Meeting 1:\none\n\nMeeting 2 (work):\ntwo"
        );
    }
}
