//! Chroma HTTP backend (v1 REST API).
//!
//! The server stores and compares vectors only. Every upserted document and
//! every query must carry an embedding computed by the caller.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::backend::IndexBackend;
use crate::error::{IndexError, Result};
use crate::types::{IndexDocument, IndexHit, Metadata, QueryInput};

/// Default Chroma server URL.
pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a Metadata>,
    embeddings: Vec<&'a [f32]>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl QueryResponse {
    /// Flatten the single-query result into hits.
    fn into_hits(self) -> Vec<IndexHit> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let mut documents = self
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut metadatas = self
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut distances = self
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();

        ids.into_iter()
            .map(|id| IndexHit {
                id,
                document: documents.next().flatten().unwrap_or_default(),
                metadata: metadatas.next().flatten().unwrap_or_default(),
                distance: distances.next().unwrap_or(f32::MAX),
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chroma Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Chroma index backend.
pub struct ChromaBackend {
    client: Client,
    base_url: String,
    collection_ids: Mutex<HashMap<String, String>>,
}

impl ChromaBackend {
    /// Create a backend for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IndexError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection_ids: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(IndexError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Resolve a collection name to its id, creating it if needed.
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.collection_ids.lock().get(name) {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(self.url("/collections"))
            .json(&CreateCollection {
                name,
                get_or_create: true,
            })
            .send()
            .await?;
        let response = Self::check(response)
            .await
            .map_err(|e| IndexError::Collection(format!("{name}: {e}")))?;
        let collection: CollectionResponse = response.json().await?;

        info!(collection = name, id = %collection.id, "Resolved Chroma collection");
        self.collection_ids
            .lock()
            .insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }

    async fn upsert_documents(
        &self,
        collection_id: &str,
        docs: &[IndexDocument],
        embeddings: Vec<&[f32]>,
    ) -> Result<()> {
        let body = UpsertRequest {
            ids: docs.iter().map(|d| d.id.as_str()).collect(),
            documents: docs.iter().map(|d| d.document.as_str()).collect(),
            metadatas: docs.iter().map(|d| &d.metadata).collect(),
            embeddings,
        };
        let response = self
            .client
            .post(self.url(&format!("/collections/{collection_id}/upsert")))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Build a Chroma `where` clause. Several keys are combined with `$and`.
pub fn where_clause(filter: &Metadata) -> Option<Value> {
    match filter.len() {
        0 => None,
        1 => Some(Value::Object(filter.clone())),
        _ => {
            let clauses: Vec<Value> = filter
                .iter()
                .map(|(key, value)| {
                    let mut clause = Metadata::new();
                    clause.insert(key.clone(), value.clone());
                    Value::Object(clause)
                })
                .collect();
            Some(json!({ "$and": clauses }))
        }
    }
}

#[async_trait]
impl IndexBackend for ChromaBackend {
    async fn upsert(&self, collection: &str, documents: Vec<IndexDocument>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let embeddings = documents
            .iter()
            .map(|d| {
                d.embedding
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| IndexError::EmbeddingRequired(format!("document {}", d.id)))
            })
            .collect::<Result<Vec<&[f32]>>>()?;

        let id = self.collection_id(collection).await?;
        self.upsert_documents(&id, &documents, embeddings).await?;

        debug!(collection, count = documents.len(), "Upserted into Chroma");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        input: &QueryInput,
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<IndexHit>> {
        let embedding = match input {
            QueryInput::Embedding(embedding) if !embedding.is_empty() => embedding,
            _ => {
                return Err(IndexError::EmbeddingRequired(format!(
                    "text query on {collection}"
                )));
            }
        };
        let id = self.collection_id(collection).await?;

        let mut body = json!({
            "n_results": k,
            "include": ["documents", "metadatas", "distances"],
            "query_embeddings": [embedding],
        });
        if let Some(clause) = filter.and_then(where_clause) {
            body["where"] = clause;
        }

        let response = self
            .client
            .post(self.url(&format!("/collections/{id}/query")))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.into_hits())
    }

    async fn heartbeat(&self) -> Result<()> {
        let response = self.client.get(self.url("/heartbeat")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "chroma"
    }
}
