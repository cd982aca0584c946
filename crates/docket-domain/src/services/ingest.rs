//! Channel ingestion loop.
//!
//! Polls one channel, drops anything at or below the watermark, and routes
//! each new message either into the meeting pipeline or to the question
//! path. One loop per channel: the watermark is not shared between pollers.

use std::str::FromStr;
use std::time::{Duration, Instant};

use docket_channel::SharedChannel;
use docket_index::{EntryKind, Metadata};
use docket_types::{ConversationTurn, MeetingSource, NewConversationTurn, TurnKind};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::Services;
use super::pipeline::{MeetingPipeline, ProcessRequest};
use super::query::QueryService;
use crate::classifier::classify;
use crate::error::Result;

/// Sent once when the loop starts, if enabled.
pub const GREETING: &str = "🤖 Docket is now active!\n\n\
Send me meeting notes and I'll:\n\
• Extract action items\n\
• Create calendar reminders\n\
• Summarize key points\n\
• Answer questions about your meetings";

/// Sent when handling a message fails.
pub const ERROR_APOLOGY: &str =
    "Sorry, I encountered an error processing your message. Please try again later.";

/// Loop timing.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Wait after a successful poll.
    pub poll_interval: Duration,
    /// Wait after a failed poll.
    pub error_backoff: Duration,
    pub greet_on_start: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            error_backoff: Duration::from_secs(5),
            greet_on_start: true,
        }
    }
}

/// Snapshot of loop state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStatus {
    pub running: bool,
    /// Timestamp of the newest message accepted so far.
    pub watermark: Option<i64>,
    pub handled: u64,
    pub failed: u64,
    /// Messages dropped as duplicates or out of order.
    pub skipped: u64,
}

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub received: usize,
    pub handled: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Polls a channel and feeds new messages through the domain services.
pub struct IngestionLoop {
    pipeline: MeetingPipeline,
    query: QueryService,
    channel: SharedChannel,
    config: IngestConfig,
    state: Mutex<LoopStatus>,
}

impl IngestionLoop {
    pub fn new(services: Services, channel: SharedChannel, config: IngestConfig) -> Self {
        Self {
            pipeline: MeetingPipeline::new(services.clone()),
            query: QueryService::new(services),
            channel,
            config,
            state: Mutex::new(LoopStatus::default()),
        }
    }

    /// Start from a known watermark instead of accepting everything.
    pub fn with_watermark(self, watermark: i64) -> Self {
        self.state.lock().watermark = Some(watermark);
        self
    }

    pub fn status(&self) -> LoopStatus {
        *self.state.lock()
    }

    /// Poll until `cancel` fires.
    ///
    /// A cycle in progress always completes; cancellation is only observed
    /// between cycles and while waiting.
    pub async fn run(&self, cancel: CancellationToken) {
        self.state.lock().running = true;
        info!(channel = self.channel.name(), "Starting message monitoring");

        if self.config.greet_on_start
            && let Err(e) = self.channel.send_text(GREETING).await
        {
            warn!(error = %e, "Failed to send greeting");
        }

        while !cancel.is_cancelled() {
            let wait = match self.poll_once().await {
                Ok(report) => {
                    if report.received > 0 {
                        debug!(?report, "Poll complete");
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    error!(error = %e, "Error in message monitoring");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        let status = {
            let mut state = self.state.lock();
            state.running = false;
            *state
        };
        info!(
            handled = status.handled,
            failed = status.failed,
            skipped = status.skipped,
            "Stopped message monitoring"
        );
    }

    /// Receive once and handle every new message.
    ///
    /// Only a failed `receive` is an error. Failures while handling a
    /// message are answered with an apology and counted.
    pub async fn poll_once(&self) -> Result<PollReport> {
        let messages = self.channel.receive().await?;
        let mut report = PollReport {
            received: messages.len(),
            ..PollReport::default()
        };

        for message in messages {
            if !self.advance_watermark(message.timestamp) {
                debug!(timestamp = message.timestamp, "Skipping already-seen message");
                report.skipped += 1;
                continue;
            }

            match self.handle_message(&message.text).await {
                Ok(turn) => {
                    report.handled += 1;
                    self.state.lock().handled += 1;
                    info!(
                        kind = turn.kind.as_str(),
                        duration_ms = turn.duration.as_millis() as u64,
                        "Message processed successfully"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    self.state.lock().failed += 1;
                    error!(error = %e, "Error processing message");
                    if let Err(e) = self.channel.send_text(ERROR_APOLOGY).await {
                        warn!(error = %e, "Failed to send apology");
                    }
                }
            }
        }

        Ok(report)
    }

    /// Accept `timestamp` if it is newer than anything seen so far.
    fn advance_watermark(&self, timestamp: i64) -> bool {
        let mut state = self.state.lock();
        if state.watermark.is_some_and(|w| timestamp <= w) {
            state.skipped += 1;
            return false;
        }
        state.watermark = Some(timestamp);
        true
    }

    async fn handle_message(&self, text: &str) -> Result<ConversationTurn> {
        let started = Instant::now();
        let kind = classify(text);
        info!(message_length = text.len(), kind = kind.as_str(), "Processing message");

        let output = match kind {
            TurnKind::Meeting => {
                let source = MeetingSource::from_str(self.channel.name()).unwrap_or_default();
                let request = ProcessRequest::new(text)
                    .with_chat_id(self.channel.chat_id())
                    .with_source(source);
                self.pipeline
                    .process(request, Some(self.channel.as_ref()))
                    .await?
                    .summary
            }
            TurnKind::Query => {
                let answer = self.query.answer(text).await;
                self.channel.send_text(&answer.text).await?;
                answer.text
            }
        };

        let turn = self
            .pipeline
            .services()
            .store()
            .record_conversation(&NewConversationTurn {
                chat_id: self.channel.chat_id().to_string(),
                input: text.to_string(),
                output,
                kind,
                duration: started.elapsed(),
            })?;
        self.index_turn(&turn).await;
        Ok(turn)
    }

    async fn index_turn(&self, turn: &ConversationTurn) {
        let mut metadata = Metadata::new();
        metadata.insert("chat_id".to_string(), json!(turn.chat_id));
        metadata.insert("message_kind".to_string(), json!(turn.kind.as_str()));

        let text = format!("User: {}\nAssistant: {}", turn.input, turn.output);
        let services = self.pipeline.services();
        let embedding = services.gateway().embed(&text).await.into_value();
        if let Err(e) = services
            .index()
            .index(EntryKind::Conversation, turn.id, &text, metadata, Some(embedding))
            .await
        {
            warn!(turn_id = turn.id, error = %e, "Failed to index conversation");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docket_channel::{InboundMessage, MockChannel};
    use docket_index::{MemoryIndexBackend, SemanticIndex};
    use docket_llm::{Gateway, MockBackend, MockReply};
    use docket_store::{MeetingStore, SqliteStore};

    use super::*;
    use crate::services::DomainConfig;

    struct Harness {
        ingest: IngestionLoop,
        channel: Arc<MockChannel>,
        index: Arc<MemoryIndexBackend>,
        store: Arc<SqliteStore>,
    }

    fn harness() -> Harness {
        let backend = MockBackend::new().with_fallback(MockReply::Text("Noted.".to_string()));
        let index = Arc::new(MemoryIndexBackend::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let channel = Arc::new(MockChannel::new());

        let services = Services::new(
            Gateway::new(Arc::new(backend)),
            SemanticIndex::new(index.clone()),
            store.clone(),
        )
        .with_config(DomainConfig {
            send_delay: Duration::ZERO,
            ..DomainConfig::default()
        });

        Harness {
            ingest: IngestionLoop::new(services, channel.clone(), IngestConfig::default()),
            channel,
            index,
            store,
        }
    }

    #[tokio::test]
    async fn test_duplicate_and_older_timestamps_are_skipped() {
        let h = harness();
        h.channel.push_batch(vec![
            InboundMessage::new("what is on my plate?", 100),
            InboundMessage::new("what is on my plate?", 100),
            InboundMessage::new("anything older?", 50),
        ]);

        let report = h.ingest.poll_once().await.unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.handled, 1);
        assert_eq!(report.skipped, 2);

        let status = h.ingest.status();
        assert_eq!(status.watermark, Some(100));
        assert_eq!(status.skipped, 2);
        assert_eq!(h.store.recent_conversations("mock-chat", 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_question_is_answered_and_recorded() {
        let h = harness();
        h.channel.push("what did Alice promise?", 7);

        h.ingest.poll_once().await.unwrap();

        assert_eq!(h.channel.texts(), vec!["Noted.".to_string()]);
        let turns = h.store.recent_conversations("mock-chat", 10).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].kind, TurnKind::Query);
        assert_eq!(turns[0].output, "Noted.");
        assert_eq!(h.index.len(EntryKind::Conversation.collection()), 1);
    }

    #[tokio::test]
    async fn test_receive_error_propagates() {
        let h = harness();
        h.channel.push_receive_error("signal-cli exploded");

        assert!(h.ingest.poll_once().await.is_err());
        assert_eq!(h.ingest.status(), LoopStatus::default());
    }

    #[tokio::test]
    async fn test_handling_failure_sends_apology() {
        let h = harness();
        h.index.set_unavailable(true);
        h.channel.push(
            "Meeting with the team. We discussed the agenda and next steps.",
            1,
        );

        let report = h.ingest.poll_once().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(h.ingest.status().failed, 1);
        assert_eq!(h.channel.texts().last().map(String::as_str), Some(ERROR_APOLOGY));
        // The watermark still advances so the message is not retried.
        assert_eq!(h.ingest.status().watermark, Some(1));
    }

    #[tokio::test]
    async fn test_run_greets_and_stops_when_cancelled() {
        let h = harness();
        let cancel = CancellationToken::new();
        cancel.cancel();

        h.ingest.run(cancel).await;

        assert_eq!(h.channel.texts(), vec![GREETING.to_string()]);
        assert_eq!(h.channel.receive_calls(), 0);
        assert!(!h.ingest.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_backs_off_after_receive_error() {
        let h = harness();
        h.channel.push_receive_error("signal-cli offline");
        let cancel = CancellationToken::new();

        let checks = async {
            // Failed poll at t=0, next poll after the 5s backoff.
            tokio::time::sleep(Duration::from_millis(4_900)).await;
            assert_eq!(h.channel.receive_calls(), 1);
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(h.channel.receive_calls(), 2);

            // Normal poll at t=5s, next poll after the 2s interval.
            tokio::time::sleep(Duration::from_millis(1_800)).await;
            assert_eq!(h.channel.receive_calls(), 2);
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(h.channel.receive_calls(), 3);
            cancel.cancel();
        };

        tokio::join!(h.ingest.run(cancel.clone()), checks);
        assert!(!h.ingest.status().running);
    }

    #[tokio::test]
    async fn test_conversation_turn_is_embedded() {
        let backend = MockBackend::new()
            .with_fallback(MockReply::Text("Noted.".to_string()))
            .with_embedding(vec![0.5, 0.5]);
        let index = Arc::new(MemoryIndexBackend::new());
        let channel = Arc::new(MockChannel::new());
        let services = Services::new(
            Gateway::new(Arc::new(backend)),
            SemanticIndex::new(index.clone()),
            Arc::new(SqliteStore::open_in_memory().unwrap()),
        );
        let ingest = IngestionLoop::new(services, channel.clone(), IngestConfig::default());

        channel.push("what did Alice promise?", 1);
        ingest.poll_once().await.unwrap();

        let docs = index.documents(EntryKind::Conversation.collection());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].embedding.as_deref(), Some(&[0.5, 0.5][..]));
    }

    #[tokio::test]
    async fn test_with_watermark_resumes() {
        let h = harness();
        let ingest = h.ingest.with_watermark(10);
        h.channel.push("old question?", 10);

        let report = ingest.poll_once().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(h.channel.texts().is_empty());
    }
}
