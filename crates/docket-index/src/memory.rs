//! In-process index backend.
//!
//! Embedding queries rank by cosine distance; text queries rank by cosine
//! distance between term-frequency vectors. Good enough for a single user
//! and for tests; use Chroma for anything larger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::IndexBackend;
use crate::error::{IndexError, Result};
use crate::types::{IndexDocument, IndexHit, Metadata, QueryInput};

/// Index backend kept entirely in memory.
#[derive(Default)]
pub struct MemoryIndexBackend {
    collections: RwLock<HashMap<String, Vec<IndexDocument>>>,
    unavailable: AtomicBool,
}

impl MemoryIndexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, as if the server were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of entries in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Copies of the stored documents in a collection.
    pub fn documents(&self, collection: &str) -> Vec<IndexDocument> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// True when a collection has no entries.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(IndexError::Unavailable("memory index disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IndexBackend for MemoryIndexBackend {
    async fn upsert(&self, collection: &str, documents: Vec<IndexDocument>) -> Result<()> {
        self.check()?;
        let mut collections = self.collections.write();
        let entries = collections.entry(collection.to_string()).or_default();
        for doc in documents {
            match entries.iter_mut().find(|e| e.id == doc.id) {
                Some(existing) => *existing = doc,
                None => entries.push(doc),
            }
        }
        debug!(collection, size = entries.len(), "Upserted into memory index");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        input: &QueryInput,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<IndexHit>> {
        self.check()?;
        let collections = self.collections.read();
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let query_terms = match input {
            QueryInput::Text(text) => Some(term_frequencies(text)),
            QueryInput::Embedding(_) => None,
        };

        let mut hits: Vec<IndexHit> = entries
            .iter()
            .filter(|doc| matches_filter(&doc.metadata, filter))
            .filter_map(|doc| {
                let similarity = match (input, &query_terms) {
                    (QueryInput::Embedding(query), _) => {
                        cosine_similarity(query, doc.embedding.as_deref()?)
                    }
                    (QueryInput::Text(_), Some(terms)) => {
                        term_cosine(terms, &term_frequencies(&doc.document))
                    }
                    (QueryInput::Text(_), None) => return None,
                };
                Some(IndexHit {
                    id: doc.id.clone(),
                    document: doc.document.clone(),
                    metadata: doc.metadata.clone(),
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn heartbeat(&self) -> Result<()> {
        self.check()
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn matches_filter(metadata: &Metadata, filter: Option<&Metadata>) -> bool {
    filter.is_none_or(|filter| {
        filter
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    })
}

/// Cosine similarity between two embeddings; 0 on dimension mismatch.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut counts = HashMap::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *counts.entry(term.to_lowercase()).or_insert(0.0) += 1.0;
    }
    counts
}

fn term_cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a: f32 = a.values().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
