//! Error types for the index crate.

use thiserror::Error;

/// Errors that can occur in the semantic index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Network/connectivity error talking to the index server.
    #[error("Network error: {0}")]
    Network(String),

    /// The index server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Collection could not be created or resolved.
    #[error("Collection error: {0}")]
    Collection(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend is not accepting requests.
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    /// The backend only stores and searches precomputed vectors.
    #[error("Embedding required: {0}")]
    EmbeddingRequired(String),

    /// Invalid input.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IndexError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            IndexError::Network(format!("Connection failed: {}", err))
        } else {
            IndexError::Network(err.to_string())
        }
    }
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
