//! Error types for message channels.

use thiserror::Error;

/// Result type alias using ChannelError.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Errors that can occur while talking to a message channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Network/connection error.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote API rejected the call.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The channel's helper process failed.
    #[error("Command failed: {0}")]
    Command(String),

    /// Channel is not configured or not reachable.
    #[error("Channel unavailable: {0}")]
    Unavailable(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<teloxide::RequestError> for ChannelError {
    fn from(err: teloxide::RequestError) -> Self {
        match err {
            // The Bot API reports errors by description; the HTTP status is not kept.
            teloxide::RequestError::Api(api) => ChannelError::Api {
                status: 0,
                message: api.to_string(),
            },
            other => ChannelError::Network(other.to_string()),
        }
    }
}
