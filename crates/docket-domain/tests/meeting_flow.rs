//! End-to-end flows through the domain services with in-process backends.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use docket_channel::{InboundMessage, MockChannel, SentItem};
use docket_domain::{
    DomainConfig, DomainError, IngestConfig, IngestionLoop, MeetingPipeline, ProcessRequest,
    QueryService, Services, classify,
};
use docket_index::{EntryKind, MemoryIndexBackend, NO_CONTEXT, SemanticIndex};
use docket_llm::{Gateway, MockBackend, MockReply};
use docket_store::{MeetingStore, SqliteStore};
use docket_types::{ActionStatus, Category, Priority, TurnKind};

const NOTES: &str =
    "Meeting with Alice and Bob. Action item: send budget report by 2024-01-15, high priority.";

fn scripted_backend() -> MockBackend {
    MockBackend::new()
        .on_system(
            "descriptive title",
            MockReply::Text("Q1 Budget Sync".to_string()),
        )
        .on_system("categorize", MockReply::Text("finance".to_string()))
        .on_system(
            "extracting action items",
            MockReply::Text(
                r#"```json
[{"title": "Send budget report", "description": "Q1 numbers to finance", "due_date": "2024-01-15", "priority": "high", "requires_travel": false}]
```"#
                    .to_string(),
            ),
        )
        .on_system(
            "summarizing meetings",
            MockReply::Text("Alice and Bob agreed on the Q1 budget.".to_string()),
        )
        .on_system(
            "helpful personal assistant",
            MockReply::Text("Alice owes the budget report.".to_string()),
        )
}

const TWO_ITEMS: &str = r#"[
  {"title": "Send budget report", "description": "", "due_date": "2024-01-15", "priority": "high", "requires_travel": false},
  {"title": "Book venue", "description": "", "due_date": "2024-01-20", "priority": "low", "requires_travel": false}
]"#;

fn two_item_backend() -> MockBackend {
    MockBackend::new()
        .on_system(
            "descriptive title",
            MockReply::Text("Offsite Planning".to_string()),
        )
        .on_system("categorize", MockReply::Text("work".to_string()))
        .on_system(
            "extracting action items",
            MockReply::Text(TWO_ITEMS.to_string()),
        )
        .on_system(
            "summarizing meetings",
            MockReply::Text("Budget and venue agreed.".to_string()),
        )
}

struct World {
    services: Services,
    index: Arc<MemoryIndexBackend>,
    store: Arc<SqliteStore>,
}

fn world(backend: MockBackend) -> World {
    world_with(backend, DomainConfig::default())
}

fn world_with(backend: MockBackend, config: DomainConfig) -> World {
    let index = Arc::new(MemoryIndexBackend::new());
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let services = Services::new(
        Gateway::new(Arc::new(backend)),
        SemanticIndex::new(index.clone()),
        store.clone(),
    )
    .with_config(DomainConfig {
        send_delay: Duration::ZERO,
        ..config
    });
    World {
        services,
        index,
        store,
    }
}

#[tokio::test]
async fn test_meeting_notes_become_item_and_reminder() {
    let w = world(scripted_backend());
    let pipeline = MeetingPipeline::new(w.services.clone());
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

    let result = pipeline
        .process_at(ProcessRequest::new(NOTES), None, now)
        .await
        .unwrap();

    assert!(result.degraded.is_empty(), "{:?}", result.degraded);
    assert_eq!(result.meeting.title, "Q1 Budget Sync");
    assert_eq!(result.meeting.category, Category::Finance);
    assert!(result.meeting.processed);
    assert!(result.delivery.is_none());

    assert_eq!(result.action_items.len(), 1);
    let item = &result.action_items[0];
    assert_eq!(item.priority, Priority::High);
    assert_eq!(item.status, ActionStatus::Pending);
    assert_eq!(item.reminder_minutes, 60);
    assert_eq!(
        item.due_date.map(|d| d.to_string()).as_deref(),
        Some("2024-01-15 00:00:00")
    );

    assert_eq!(result.reminders.len(), 1);
    assert_eq!(result.reminders[0].alarm_minutes, vec![60]);
    assert!(result.reminders[0].filename.ends_with(".ics"));
    assert!(result.reminders[0].content.contains("BEGIN:VCALENDAR"));

    let stored = w.store.get_meeting(result.meeting.id).unwrap().unwrap();
    assert!(stored.processed);
    assert!(stored.vector_id.is_some());
    assert_eq!(
        stored.summary.as_deref(),
        Some("Alice and Bob agreed on the Q1 budget.")
    );
    assert_eq!(w.index.len(EntryKind::Meeting.collection()), 1);
    assert_eq!(w.index.len(EntryKind::ActionItem.collection()), 1);
}

#[tokio::test]
async fn test_delivery_sends_summary_file_and_ack() {
    let w = world(scripted_backend());
    let pipeline = MeetingPipeline::new(w.services.clone());
    let channel = MockChannel::new();

    let result = pipeline
        .process(ProcessRequest::new(NOTES), Some(&channel))
        .await
        .unwrap();

    let delivery = result.delivery.unwrap();
    assert!(delivery.summary_sent);
    assert_eq!(delivery.files_sent, 1);

    let sent = channel.sent();
    assert!(matches!(&sent[0], SentItem::Text(t) if t.contains("Send budget report")));
    assert!(matches!(&sent[1], SentItem::File { filename, .. } if filename.ends_with(".ics")));
    assert!(matches!(sent.last(), Some(SentItem::Text(_))));
}

#[tokio::test]
async fn test_question_without_meetings_uses_sentinel_context() {
    let w = world(scripted_backend());
    let context = w.services.index().context_for("budget", 3).await.into_value();
    assert_eq!(context.text, NO_CONTEXT);

    let answer = QueryService::new(w.services.clone())
        .answer("who owes the budget report?")
        .await;
    assert!(answer.sources.is_empty());
    assert_eq!(answer.text, "Alice owes the budget report.");
}

#[tokio::test]
async fn test_question_after_meeting_finds_it() {
    let w = world(scripted_backend());
    MeetingPipeline::new(w.services.clone())
        .process(ProcessRequest::new(NOTES), None)
        .await
        .unwrap();

    let answer = QueryService::new(w.services.clone())
        .answer("budget report for Alice")
        .await;
    assert_eq!(answer.sources.len(), 1);
    assert!(answer.sources[0].document.contains("budget report"));
    assert!(!answer.degraded);
}

#[tokio::test]
async fn test_model_outage_still_stores_meeting() {
    let w = world(MockBackend::new().with_fallback(MockReply::Timeout));
    let result = MeetingPipeline::new(w.services.clone())
        .process(ProcessRequest::new(NOTES), None)
        .await
        .unwrap();

    assert!(result.meeting.title.starts_with("Meeting - "));
    assert_eq!(result.meeting.category, Category::Other);
    assert!(result.action_items.is_empty());
    assert!(!result.degraded.is_empty());
    assert!(w.store.get_meeting(result.meeting.id).unwrap().unwrap().processed);
}

#[tokio::test]
async fn test_loop_routes_by_classification() {
    let w = world(scripted_backend());
    let channel = Arc::new(MockChannel::with_chat_id("chat-1"));
    let ingest = IngestionLoop::new(w.services.clone(), channel.clone(), IngestConfig::default());

    assert_eq!(classify(NOTES), TurnKind::Meeting);
    assert_eq!(classify("who owes the budget report?"), TurnKind::Query);

    channel.push_batch(vec![
        InboundMessage::new(NOTES, 100),
        InboundMessage::new("who owes the budget report?", 101),
    ]);
    let report = ingest.poll_once().await.unwrap();
    assert_eq!(report.handled, 2);

    let turns = w.store.recent_conversations("chat-1", 10).unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].kind, TurnKind::Query);
    assert_eq!(turns[1].kind, TurnKind::Meeting);

    let meetings = w.store.list_meetings(None, 10, 0).unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].chat_id.as_deref(), Some("chat-1"));
    assert_eq!(w.index.len(EntryKind::Conversation.collection()), 2);
}

#[tokio::test]
async fn test_loop_drops_replayed_batch() {
    let w = world(scripted_backend());
    let channel = Arc::new(MockChannel::new());
    let ingest = IngestionLoop::new(w.services.clone(), channel.clone(), IngestConfig::default());

    channel.push("who owes the budget report?", 100);
    channel.push("who owes the budget report?", 100);
    channel.push("anything from last week?", 50);

    for _ in 0..3 {
        ingest.poll_once().await.unwrap();
    }
    let status = ingest.status();
    assert_eq!(status.handled, 1);
    assert_eq!(status.skipped, 2);
    assert_eq!(status.watermark, Some(100));
}

#[tokio::test]
async fn test_delivery_counts_failed_file_and_continues() {
    let w = world(two_item_backend());
    let channel = MockChannel::new();
    channel.fail_next_files(1);

    let result = MeetingPipeline::new(w.services.clone())
        .process(ProcessRequest::new(NOTES), Some(&channel))
        .await
        .unwrap();

    assert_eq!(result.reminders.len(), 2);
    let delivery = result.delivery.unwrap();
    assert!(delivery.summary_sent);
    assert_eq!(delivery.files_attempted, 2);
    assert_eq!(delivery.files_sent, 1);
    assert_eq!(delivery.files_failed, 1);

    // The second file still went out and the completion note reports the loss.
    assert_eq!(channel.filenames().len(), 1);
    let last = channel.texts().pop().unwrap();
    assert!(last.contains("1 of 2"), "{last}");
}

#[tokio::test]
async fn test_escalated_deadline_reminders() {
    let w = world_with(
        two_item_backend(),
        DomainConfig {
            escalate_deadlines: true,
            ..DomainConfig::default()
        },
    );
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

    let result = MeetingPipeline::new(w.services.clone())
        .process_at(ProcessRequest::new(NOTES), None, now)
        .await
        .unwrap();

    assert_eq!(result.reminders.len(), 2);
    let high = result
        .reminders
        .iter()
        .find(|r| r.title == "Send budget report")
        .unwrap();
    assert_eq!(high.alarm_minutes, vec![10080, 4320, 1440, 120]);
    assert_eq!(high.content.matches("BEGIN:VALARM").count(), 4);
    assert!(high.content.contains("DEADLINE: Send budget report"));

    let low = result
        .reminders
        .iter()
        .find(|r| r.title == "Book venue")
        .unwrap();
    assert_eq!(low.alarm_minutes.len(), 1);
}

#[tokio::test]
async fn test_everything_indexed_with_embeddings() {
    let w = world(scripted_backend().with_embedding(vec![0.5, 0.5]));
    MeetingPipeline::new(w.services.clone())
        .process(ProcessRequest::new(NOTES), None)
        .await
        .unwrap();

    for kind in [EntryKind::Meeting, EntryKind::ActionItem] {
        let docs = w.index.documents(kind.collection());
        assert_eq!(docs.len(), 1, "{kind}");
        assert_eq!(docs[0].embedding.as_deref(), Some(&[0.5, 0.5][..]), "{kind}");
    }
}

#[tokio::test]
async fn test_search_meetings_joins_store_rows() {
    let w = world(scripted_backend());
    let pipeline = MeetingPipeline::new(w.services.clone());
    let stored = pipeline
        .process(ProcessRequest::new(NOTES), None)
        .await
        .unwrap()
        .meeting;

    let matches = pipeline.search_meetings("budget report", 5).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].meeting.id, stored.id);
    assert_eq!(matches[0].meeting.title, "Q1 Budget Sync");
    assert!(matches[0].relevance > 0.0 && matches[0].relevance <= 1.0);
    assert_eq!(matches[0].snippet, NOTES);
}

#[tokio::test]
async fn test_regenerate_calendar_only_pending_dated_items() {
    let w = world(two_item_backend());
    let pipeline = MeetingPipeline::new(w.services.clone());
    let result = pipeline
        .process(ProcessRequest::new(NOTES), None)
        .await
        .unwrap();

    let venue = result
        .action_items
        .iter()
        .find(|i| i.title == "Book venue")
        .unwrap();
    w.store
        .update_action_item_status(venue.id, ActionStatus::Completed)
        .unwrap();

    let artifacts = pipeline.regenerate_calendar(result.meeting.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].title, "Send budget report");
    assert!(artifacts[0].content.contains("BEGIN:VCALENDAR"));

    let missing = pipeline.regenerate_calendar(result.meeting.id + 100);
    assert!(matches!(missing, Err(DomainError::MeetingNotFound(_))));
}
