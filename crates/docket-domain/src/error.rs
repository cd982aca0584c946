//! Domain error types.

use thiserror::Error;

/// Domain-level errors.
///
/// Model backend problems never show up here: the gateway degrades them.
/// What remains is fatal to the operation that hit it.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] docket_store::StoreError),

    /// Writing to the semantic index failed.
    #[error("Index error: {0}")]
    Index(#[from] docket_index::IndexError),

    /// The message channel failed.
    #[error("Channel error: {0}")]
    Channel(#[from] docket_channel::ChannelError),

    /// No meeting with this id is stored.
    #[error("Meeting {0} not found")]
    MeetingNotFound(docket_types::RecordId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
