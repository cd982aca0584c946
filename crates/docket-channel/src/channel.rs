//! The message channel capability set.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    /// Channel-specific monotonic position (epoch millis for Signal,
    /// message id for Telegram).
    pub timestamp: i64,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }
}

/// A file to deliver through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl OutboundFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Capability set every messaging backend exposes.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Short backend name ("signal", "telegram", ...).
    fn name(&self) -> &str;

    /// Identifier of the conversation this channel talks to.
    fn chat_id(&self) -> &str;

    async fn send_text(&self, text: &str) -> Result<()>;

    async fn send_file(&self, file: &OutboundFile, caption: Option<&str>) -> Result<()>;

    /// Messages received since the previous call. May return duplicates;
    /// callers deduplicate by timestamp.
    async fn receive(&self) -> Result<Vec<InboundMessage>>;

    /// Check the channel is configured and reachable.
    async fn health_check(&self) -> Result<()>;
}

/// Shared channel handle.
pub type SharedChannel = Arc<dyn MessageChannel>;
