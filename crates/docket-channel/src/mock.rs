//! Scripted channel for tests.
//!
//! Inbound messages are queued as batches; each `receive` call pops one
//! batch (or returns nothing). Everything sent is captured for assertions.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::channel::{InboundMessage, MessageChannel, OutboundFile};
use crate::error::{ChannelError, Result};

/// One captured outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Text(String),
    File {
        filename: String,
        content: Vec<u8>,
        caption: Option<String>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    inbound: VecDeque<Result<Vec<InboundMessage>>>,
    sent: Vec<SentItem>,
    fail_files: usize,
    receive_calls: usize,
}

/// An in-memory message channel.
#[derive(Debug)]
pub struct MockChannel {
    chat_id: String,
    state: Mutex<MockState>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::with_chat_id("mock-chat")
    }

    pub fn with_chat_id(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Queue a batch returned by one `receive` call.
    pub fn push_batch(&self, messages: Vec<InboundMessage>) {
        self.state.lock().inbound.push_back(Ok(messages));
    }

    /// Queue a single-message batch.
    pub fn push(&self, text: impl Into<String>, timestamp: i64) {
        self.push_batch(vec![InboundMessage::new(text, timestamp)]);
    }

    /// Queue a failing `receive` call.
    pub fn push_receive_error(&self, message: impl Into<String>) {
        self.state
            .lock()
            .inbound
            .push_back(Err(ChannelError::Unavailable(message.into())));
    }

    /// Make the next `n` file sends fail.
    pub fn fail_next_files(&self, n: usize) {
        self.state.lock().fail_files = n;
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<SentItem> {
        self.state.lock().sent.clone()
    }

    /// Sent text messages only.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|item| match item {
                SentItem::Text(text) => Some(text),
                SentItem::File { .. } => None,
            })
            .collect()
    }

    /// Names of sent files.
    pub fn filenames(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|item| match item {
                SentItem::File { filename, .. } => Some(filename),
                SentItem::Text(_) => None,
            })
            .collect()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageChannel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    fn chat_id(&self) -> &str {
        &self.chat_id
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.state.lock().sent.push(SentItem::Text(text.to_string()));
        Ok(())
    }

    async fn send_file(&self, file: &OutboundFile, caption: Option<&str>) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_files > 0 {
            state.fail_files -= 1;
            return Err(ChannelError::Network("mock send failure".to_string()));
        }
        state.sent.push(SentItem::File {
            filename: file.filename.clone(),
            content: file.content.clone(),
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn receive(&self) -> Result<Vec<InboundMessage>> {
        let mut state = self.state.lock();
        state.receive_calls += 1;
        state.inbound.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_then_empty() {
        let channel = MockChannel::new();
        channel.push("one", 1);
        channel.push_receive_error("offline");

        assert_eq!(channel.receive().await.unwrap().len(), 1);
        assert!(channel.receive().await.is_err());
        assert!(channel.receive().await.unwrap().is_empty());
        assert_eq!(channel.receive_calls(), 3);
    }

    #[tokio::test]
    async fn test_captures_outbound() {
        let channel = MockChannel::new();
        channel.fail_next_files(1);

        channel.send_text("hello").await.unwrap();
        let file = OutboundFile::new("a.ics", "x");
        assert!(channel.send_file(&file, None).await.is_err());
        channel.send_file(&file, Some("cap")).await.unwrap();

        assert_eq!(channel.texts(), vec!["hello"]);
        assert_eq!(channel.filenames(), vec!["a.ics"]);
    }
}
