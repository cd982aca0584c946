//! Index entry and query types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata attached to an index entry. Values should be scalars.
pub type Metadata = Map<String, Value>;

/// What an index entry describes. Each kind lives in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Meeting,
    ActionItem,
    Conversation,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Meeting => "meeting",
            EntryKind::ActionItem => "action_item",
            EntryKind::Conversation => "conversation",
        }
    }

    /// Collection name holding entries of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntryKind::Meeting => "meetings",
            EntryKind::ActionItem => "action_items",
            EntryKind::Conversation => "conversations",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub embedding: Option<Vec<f32>>,
}

/// What to search with.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    /// Raw text. Only backends that compare text themselves accept it.
    Text(String),
    /// A precomputed embedding.
    Embedding(Vec<f32>),
}

impl QueryInput {
    /// Prefer the embedding when one is available, otherwise the text.
    pub fn best(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        if embedding.is_empty() {
            QueryInput::Text(text.into())
        } else {
            QueryInput::Embedding(embedding)
        }
    }
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(text: String) -> Self {
        QueryInput::Text(text)
    }
}

/// One search result. Smaller distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}
