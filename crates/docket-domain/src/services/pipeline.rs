//! Meeting extraction pipeline.
//!
//! One call turns a block of meeting text into a stored meeting, its action
//! items, a summary and calendar reminders:
//!
//! ```text
//! received -> titled -> categorized -> persisted -> indexed
//!          -> items extracted -> items persisted -> summarized
//!          -> reminders built -> [delivered] -> done
//! ```
//!
//! Model failures degrade inside the gateway and are only noted in
//! [`ProcessResult::degraded`]. Store and index-write failures abort the run
//! and leave whatever was already written in place, with the meeting's
//! `processed` flag still false.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use docket_channel::{MessageChannel, OutboundFile};
use docket_index::{EntryKind, IndexHit, Metadata, QueryInput};
use docket_llm::ActionItemCandidate;
use docket_reminders::ReminderArtifact;
use docket_types::{
    ActionItem, ActionStatus, Category, MeetingRecord, MeetingSource, NewActionItem, NewMeeting,
    Outcome, RecordId,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::Services;
use crate::error::{DomainError, Result};
use crate::participants::extract_participants;

/// Caption attached to each calendar file.
pub const CALENDAR_CAPTION: &str = "📅 Tap to add to your calendar";

/// Generated titles longer than this are discarded.
const MAX_TITLE_CHARS: usize = 100;

/// Characters of meeting text shown with a search match.
pub const SEARCH_SNIPPET_CHARS: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Result
// ─────────────────────────────────────────────────────────────────────────────

/// Input for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub content: String,
    /// Skip title generation.
    pub title: Option<String>,
    /// Skip categorization.
    pub category: Option<Category>,
    /// Conversation the text came from.
    pub chat_id: Option<String>,
    pub source: MeetingSource,
}

impl ProcessRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            category: None,
            chat_id: None,
            source: MeetingSource::Manual,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_source(mut self, source: MeetingSource) -> Self {
        self.source = source;
        self
    }
}

/// What happened when results were sent to a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub summary_sent: bool,
    pub files_attempted: usize,
    pub files_sent: usize,
    pub files_failed: usize,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// The stored meeting, processed.
    pub meeting: MeetingRecord,
    pub action_items: Vec<ActionItem>,
    pub summary: String,
    pub reminders: Vec<ReminderArtifact>,
    /// Present when a channel was supplied.
    pub delivery: Option<DeliveryReport>,
    /// Stages whose model call degraded to a default.
    pub degraded: Vec<String>,
}

/// A stored meeting found by similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingMatch {
    pub meeting: MeetingRecord,
    /// `1 - distance`; higher is closer.
    pub relevance: f32,
    pub snippet: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Runs meeting text through extraction, storage, indexing and scheduling.
#[derive(Clone)]
pub struct MeetingPipeline {
    services: Services,
}

impl MeetingPipeline {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Process meeting text. When `channel` is given, the summary and the
    /// reminder files are sent through it.
    pub async fn process(
        &self,
        request: ProcessRequest,
        channel: Option<&dyn MessageChannel>,
    ) -> Result<ProcessResult> {
        self.process_at(request, channel, Utc::now()).await
    }

    /// [`process`](Self::process) against a fixed clock.
    pub async fn process_at(
        &self,
        request: ProcessRequest,
        channel: Option<&dyn MessageChannel>,
        now: DateTime<Utc>,
    ) -> Result<ProcessResult> {
        let result = self.run(request, channel, now).await;
        if let Err(e) = &result {
            error!(error = %e, "Error processing meeting");
        }
        result
    }

    /// Meetings similar to `query`, closest first.
    pub async fn search_similar_meetings(&self, query: &str, limit: usize) -> Vec<IndexHit> {
        let embedding = self.services.gateway().embed(query).await.into_value();
        self.services
            .index()
            .search(EntryKind::Meeting, QueryInput::best(query, embedding), limit)
            .await
    }

    /// Stored meetings similar to `query`, with relevance and a snippet.
    ///
    /// Index hits whose meeting is no longer stored are skipped.
    pub async fn search_meetings(&self, query: &str, limit: usize) -> Result<Vec<MeetingMatch>> {
        let store = self.services.store();
        let mut matches = Vec::new();
        for hit in self.search_similar_meetings(query, limit).await {
            let Some(meeting_id) = hit.metadata.get("entity_id").and_then(|v| v.as_i64()) else {
                debug!(vector_id = %hit.id, "Index hit without a meeting id");
                continue;
            };
            let Some(meeting) = store.get_meeting(meeting_id)? else {
                debug!(meeting_id, "Index hit for a meeting no longer stored");
                continue;
            };
            matches.push(MeetingMatch {
                meeting,
                relevance: 1.0 - hit.distance,
                snippet: snippet(&hit.document, SEARCH_SNIPPET_CHARS),
            });
        }
        info!(
            query = %docket_llm::prompts::head(query, 100),
            count = matches.len(),
            "Searched meetings"
        );
        Ok(matches)
    }

    /// Rebuild reminder files for a stored meeting.
    ///
    /// Only pending action items with a due date get a file.
    pub fn regenerate_calendar(&self, meeting_id: RecordId) -> Result<Vec<ReminderArtifact>> {
        self.regenerate_calendar_at(meeting_id, Utc::now())
    }

    /// [`regenerate_calendar`](Self::regenerate_calendar) against a fixed clock.
    pub fn regenerate_calendar_at(
        &self,
        meeting_id: RecordId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderArtifact>> {
        let store = self.services.store();
        if store.get_meeting(meeting_id)?.is_none() {
            return Err(DomainError::MeetingNotFound(meeting_id));
        }
        let pending: Vec<ActionItem> = store
            .action_items_for_meeting(meeting_id)?
            .into_iter()
            .filter(|item| item.status == ActionStatus::Pending && item.due_date.is_some())
            .collect();

        let reminders = self.build_reminders(&pending, now);
        info!(meeting_id, count = reminders.len(), "Regenerated calendar files");
        Ok(reminders)
    }

    async fn run(
        &self,
        request: ProcessRequest,
        channel: Option<&dyn MessageChannel>,
        now: DateTime<Utc>,
    ) -> Result<ProcessResult> {
        let ProcessRequest {
            content,
            title,
            category,
            chat_id,
            source,
        } = request;
        let gateway = self.services.gateway();
        let store = self.services.store();
        let mut degraded = Vec::new();

        info!(content_length = content.len(), "Processing meeting content");

        let title = match title.filter(|t| !t.trim().is_empty()) {
            Some(title) => title,
            None => self.generate_title(&content, now, &mut degraded).await,
        };

        let category = match category {
            Some(category) => category,
            None => {
                let outcome = gateway.categorize(&content).await;
                note(&mut degraded, "category", &outcome);
                outcome.into_value()
            }
        };

        let participants = extract_participants(&content);

        let mut new_meeting = NewMeeting::new(title, content)
            .with_category(category)
            .with_participants(participants)
            .with_source(source);
        new_meeting.meeting_date = now;
        if let Some(chat_id) = &chat_id {
            new_meeting = new_meeting.with_chat_id(chat_id.clone());
        }
        let mut meeting = store.create_meeting(&new_meeting)?;

        let embedding = gateway.embed(&meeting.content).await;
        note(&mut degraded, "embedding", &embedding);
        let vector_id = self
            .services
            .index()
            .index(
                EntryKind::Meeting,
                meeting.id,
                &meeting.content,
                meeting_metadata(&meeting),
                Some(embedding.into_value()),
            )
            .await?;
        store.set_meeting_index_ref(meeting.id, &vector_id)?;
        meeting.vector_id = Some(vector_id);

        let candidates = gateway.extract_action_items(&meeting.content).await;
        note(&mut degraded, "action_items", &candidates);
        let mut action_items = Vec::new();
        for candidate in candidates.into_value() {
            let item = self
                .persist_action_item(
                    &meeting,
                    chat_id.as_deref(),
                    candidate,
                    now,
                    &mut degraded,
                )
                .await?;
            action_items.push(item);
        }

        let summary = gateway.summarize(&meeting.content).await;
        note(&mut degraded, "summary", &summary);
        let summary = summary.into_value();
        store.complete_meeting(meeting.id, &summary, category)?;
        meeting.processed = true;
        meeting.summary = Some(summary.clone());

        let reminders = self.build_reminders(&action_items, now);

        let delivery = match channel {
            Some(channel) => Some(
                self.deliver(channel, &meeting, &action_items, &summary, &reminders)
                    .await,
            ),
            None => None,
        };

        info!(
            meeting_id = meeting.id,
            title = %meeting.title,
            action_items = action_items.len(),
            reminders = reminders.len(),
            "Successfully processed meeting"
        );

        Ok(ProcessResult {
            meeting,
            action_items,
            summary,
            reminders,
            delivery,
            degraded,
        })
    }

    async fn generate_title(
        &self,
        content: &str,
        now: DateTime<Utc>,
        degraded: &mut Vec<String>,
    ) -> String {
        let outcome = self.services.gateway().title(content).await;
        note(degraded, "title", &outcome);
        let usable = !outcome.is_degraded();
        let title = outcome.into_value();

        if usable && !title.is_empty() && title.chars().count() <= MAX_TITLE_CHARS {
            title
        } else {
            debug!(generated = %title, "Falling back to dated title");
            fallback_title(now)
        }
    }

    async fn persist_action_item(
        &self,
        meeting: &MeetingRecord,
        chat_id: Option<&str>,
        candidate: ActionItemCandidate,
        now: DateTime<Utc>,
        degraded: &mut Vec<String>,
    ) -> Result<ActionItem> {
        let policy = self.services.calendar().policy();
        let travel = candidate.requires_travel;

        let new_item = NewActionItem {
            meeting_id: Some(meeting.id),
            chat_id: chat_id.map(str::to_string),
            title: candidate.title,
            description: candidate.description,
            due_date: candidate
                .due_date
                .as_deref()
                .map(|raw| parse_due_date(raw, now)),
            priority: candidate.priority,
            requires_travel: travel,
            travel_time_minutes: policy.travel_minutes(travel),
            reminder_minutes: policy.lead_minutes(candidate.priority, travel, None),
        };

        let store = self.services.store();
        let mut item = store.create_action_item(&new_item)?;

        let text = action_item_text(&item);
        let embedding = self.services.gateway().embed(&text).await;
        note(degraded, "action_item_embedding", &embedding);
        let vector_id = self
            .services
            .index()
            .index(
                EntryKind::ActionItem,
                item.id,
                &text,
                action_item_metadata(&item),
                Some(embedding.into_value()),
            )
            .await?;
        store.set_action_item_index_ref(item.id, &vector_id)?;
        item.vector_id = Some(vector_id);

        Ok(item)
    }

    fn build_reminders(&self, items: &[ActionItem], now: DateTime<Utc>) -> Vec<ReminderArtifact> {
        let calendar = self.services.calendar();
        if self.services.config().escalate_deadlines {
            calendar.batch(items, now)
        } else {
            items
                .iter()
                .filter(|item| item.due_date.is_some())
                .map(|item| calendar.single(item, now))
                .collect()
        }
    }

    /// Send the summary, each reminder file, then a completion note.
    ///
    /// Individual send failures are counted, never fatal.
    async fn deliver(
        &self,
        channel: &dyn MessageChannel,
        meeting: &MeetingRecord,
        items: &[ActionItem],
        summary: &str,
        reminders: &[ReminderArtifact],
    ) -> DeliveryReport {
        let delay = self.services.config().send_delay;
        let mut report = DeliveryReport::default();

        match channel
            .send_text(&summary_message(meeting, items, summary))
            .await
        {
            Ok(()) => report.summary_sent = true,
            Err(e) => warn!(channel = channel.name(), error = %e, "Failed to send meeting summary"),
        }

        if reminders.is_empty() {
            return report;
        }

        if reminders.len() > 1 {
            let intro = format!(
                "📅 I've created {} calendar reminders for you:",
                reminders.len()
            );
            if let Err(e) = channel.send_text(&intro).await {
                warn!(channel = channel.name(), error = %e, "Failed to send reminder intro");
            }
        }

        for artifact in reminders {
            tokio::time::sleep(delay).await;
            report.files_attempted += 1;
            let file = OutboundFile::new(artifact.filename.clone(), artifact.content.as_bytes());
            match channel.send_file(&file, Some(CALENDAR_CAPTION)).await {
                Ok(()) => report.files_sent += 1,
                Err(e) => {
                    report.files_failed += 1;
                    warn!(
                        channel = channel.name(),
                        filename = %artifact.filename,
                        error = %e,
                        "Failed to send calendar file"
                    );
                }
            }
        }

        tokio::time::sleep(delay).await;
        if let Err(e) = channel.send_text(&completion_message(&report)).await {
            warn!(channel = channel.name(), error = %e, "Failed to send completion message");
        }

        info!(
            sent = report.files_sent,
            failed = report.files_failed,
            "Calendar files delivered"
        );
        report
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn note<T>(degraded: &mut Vec<String>, stage: &str, outcome: &Outcome<T>) {
    if let Some(reason) = outcome.reason() {
        warn!(stage, reason, "Using fallback after model failure");
        if !degraded.iter().any(|s| s == stage) {
            degraded.push(stage.to_string());
        }
    }
}

/// Title used when none can be generated.
pub fn fallback_title(now: DateTime<Utc>) -> String {
    format!("Meeting - {}", now.format("%Y-%m-%d"))
}

/// Parse a model-supplied due date.
///
/// Accepts `YYYY-MM-DD` (midnight, i.e. all day), ISO date-times and
/// RFC 3339. Anything else means tomorrow.
pub fn parse_due_date(raw: &str, now: DateTime<Utc>) -> NaiveDateTime {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_time(NaiveTime::MIN);
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed;
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc).naive_utc();
    }

    warn!(raw, "Unparseable due date, defaulting to tomorrow");
    (now.date_naive() + ChronoDuration::days(1)).and_time(NaiveTime::MIN)
}

fn snippet(text: &str, chars: usize) -> String {
    if text.chars().count() > chars {
        let mut cut: String = text.chars().take(chars).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

fn meeting_metadata(meeting: &MeetingRecord) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("title".to_string(), json!(meeting.title));
    metadata.insert("category".to_string(), json!(meeting.category.as_str()));
    metadata.insert("date".to_string(), json!(meeting.meeting_date.to_rfc3339()));
    metadata.insert(
        "participants".to_string(),
        json!(meeting.participants.join(", ")),
    );
    metadata
}

fn action_item_text(item: &ActionItem) -> String {
    if item.description.is_empty() {
        item.title.clone()
    } else {
        format!("{}\n{}", item.title, item.description)
    }
}

fn action_item_metadata(item: &ActionItem) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(meeting_id) = item.meeting_id {
        metadata.insert("meeting_id".to_string(), json!(meeting_id));
    }
    metadata.insert("priority".to_string(), json!(item.priority.as_str()));
    if let Some(due) = item.due_date {
        metadata.insert("due_date".to_string(), json!(due.format("%Y-%m-%d").to_string()));
    }
    metadata.insert("requires_travel".to_string(), json!(item.requires_travel));
    metadata
}

fn format_due(due: NaiveDateTime) -> String {
    if due.time() == NaiveTime::MIN {
        due.format("%Y-%m-%d").to_string()
    } else {
        due.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// The chat message sent after processing.
pub fn summary_message(meeting: &MeetingRecord, items: &[ActionItem], summary: &str) -> String {
    let mut message = format!("📋 {}\n\n{}", meeting.title, summary.trim());
    if !items.is_empty() {
        message.push_str("\n\n📌 Action items:");
        for item in items {
            let due = item
                .due_date
                .map(|d| format!("due {}, ", format_due(d)))
                .unwrap_or_default();
            message.push_str(&format!("\n• {} ({}{})", item.title, due, item.priority));
        }
    }
    message
}

fn completion_message(report: &DeliveryReport) -> String {
    if report.files_failed == 0 {
        format!(
            "✅ Sent {} calendar file(s). Tap any file to add it to your calendar!",
            report.files_sent
        )
    } else if report.files_sent > 0 {
        format!(
            "✅ Sent {} of {} calendar file(s); {} could not be delivered.",
            report.files_sent, report.files_attempted, report.files_failed
        )
    } else {
        format!(
            "⚠️ Couldn't deliver any of the {} calendar file(s).",
            report.files_attempted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use docket_types::Priority;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_due_date_formats() {
        let midnight = parse_due_date("2024-01-15", now());
        assert_eq!(midnight.to_string(), "2024-01-15 00:00:00");

        let timed = parse_due_date("2024-01-15T14:30", now());
        assert_eq!(timed.to_string(), "2024-01-15 14:30:00");

        let zoned = parse_due_date("2024-01-15T14:30:00+02:00", now());
        assert_eq!(zoned.to_string(), "2024-01-15 12:30:00");
    }

    #[test]
    fn test_parse_due_date_fallback_is_tomorrow() {
        let due = parse_due_date("next Friday-ish", now());
        assert_eq!(due.to_string(), "2024-01-11 00:00:00");
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        assert_eq!(snippet("short", 200), "short");
        let long = "a".repeat(250);
        let cut = snippet(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title(now()), "Meeting - 2024-01-10");
    }

    #[test]
    fn test_completion_message_counts() {
        let all = DeliveryReport {
            summary_sent: true,
            files_attempted: 2,
            files_sent: 2,
            files_failed: 0,
        };
        assert!(completion_message(&all).contains("Sent 2 calendar"));

        let partial = DeliveryReport {
            files_sent: 1,
            files_failed: 1,
            ..all.clone()
        };
        assert!(completion_message(&partial).contains("1 of 2"));
    }

    #[test]
    fn test_summary_message_lists_items() {
        let meeting = MeetingRecord {
            id: 1,
            chat_id: None,
            title: "Budget".to_string(),
            category: Category::Finance,
            content: String::new(),
            summary: None,
            participants: Vec::new(),
            meeting_date: now(),
            processed: true,
            source: MeetingSource::Manual,
            vector_id: None,
            created_at: now(),
        };
        let item = ActionItem {
            id: 1,
            meeting_id: Some(1),
            chat_id: None,
            title: "Send report".to_string(),
            description: String::new(),
            due_date: Some(parse_due_date("2024-01-15", now())),
            priority: Priority::High,
            status: Default::default(),
            requires_travel: false,
            travel_time_minutes: 0,
            reminder_minutes: 60,
            vector_id: None,
        };

        let message = summary_message(&meeting, &[item], "- approved\n");
        assert!(message.starts_with("📋 Budget\n\n- approved"));
        assert!(message.contains("• Send report (due 2024-01-15, high)"));
    }
}
