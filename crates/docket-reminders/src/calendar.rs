//! Reminder artifacts built from action items.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use docket_types::{ActionItem, Priority, RecordId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ics::{CalendarEvent, EventTiming};
use crate::scheduler::{ReminderPolicy, default_due};

/// A calendar file for one action item.
///
/// Artifacts are never persisted; they exist for the length of a single
/// pipeline run and are handed to a channel or written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderArtifact {
    /// The action item this reminder is for.
    pub action_item_id: RecordId,
    pub title: String,
    /// Suggested file name, ending in `.ics`.
    pub filename: String,
    /// The iCalendar document.
    pub content: String,
    /// Alert offsets in minutes before the due time, as emitted.
    pub alarm_minutes: Vec<u32>,
}

/// Builds reminder artifacts under a [`ReminderPolicy`].
#[derive(Debug, Clone, Default)]
pub struct CalendarBuilder {
    policy: ReminderPolicy,
}

impl CalendarBuilder {
    pub fn new(policy: ReminderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    /// Single-alert reminder using the item's stored lead time.
    ///
    /// Items without a due date are scheduled for tomorrow at 09:00. A due
    /// time of exactly midnight produces an all-day entry, anything else a
    /// one-hour timed entry.
    pub fn single(&self, item: &ActionItem, now: DateTime<Utc>) -> ReminderArtifact {
        let due = item.due_date.unwrap_or_else(|| default_due(now));
        let lead = if item.reminder_minutes > 0 {
            item.reminder_minutes
        } else {
            self.policy
                .lead_minutes(item.priority, item.requires_travel, None)
        };

        let mut event = CalendarEvent::new(item.title.clone(), timing_for(due), now)
            .with_description(item.description.clone())
            .with_alarm(lead, format!("Reminder: {}", item.title))
            .with_priority(if item.requires_travel { 5 } else { 7 })
            .with_category("Docket")
            .with_category("Action Item");
        if item.requires_travel {
            event = event.with_category("Travel");
        }

        debug!(item_id = item.id, lead_minutes = lead, "Built single reminder");
        self.artifact(item, event.render(), vec![lead], now)
    }

    /// Deadline reminder with an escalating alert sequence.
    ///
    /// Returns `None` when the item has no due date; deadlines are never
    /// guessed.
    pub fn deadline(&self, item: &ActionItem, now: DateTime<Utc>) -> Option<ReminderArtifact> {
        let due = item.due_date?;
        let offsets = self.policy.deadline_offsets(item.priority).to_vec();

        let description = if item.description.is_empty() {
            String::new()
        } else {
            format!("Deadline: {}\n\n{}", item.title, item.description)
        };
        let mut event = CalendarEvent::new(
            format!("⏰ DEADLINE: {}", item.title),
            EventTiming::AllDay(due.date()),
            now,
        )
        .with_description(description)
        .with_priority(ical_priority(item.priority))
        .with_category("Docket")
        .with_category("Deadline")
        .with_category(capitalize(item.priority.as_str()));
        for minutes in &offsets {
            event = event.with_alarm(*minutes, format!("Deadline approaching: {}", item.title));
        }

        debug!(item_id = item.id, alarms = offsets.len(), "Built deadline reminder");
        Some(self.artifact(item, event.render(), offsets, now))
    }

    /// Reminders for a set of items.
    ///
    /// High and urgent items get the deadline escalation, others a single
    /// alert. Items without a due date are skipped.
    pub fn batch(&self, items: &[ActionItem], now: DateTime<Utc>) -> Vec<ReminderArtifact> {
        let artifacts: Vec<ReminderArtifact> = items
            .iter()
            .filter(|item| item.due_date.is_some())
            .filter_map(|item| {
                if self.policy.is_deadline(item.priority) {
                    self.deadline(item, now)
                } else {
                    Some(self.single(item, now))
                }
            })
            .collect();
        info!(count = artifacts.len(), "Built batch reminders");
        artifacts
    }

    fn artifact(
        &self,
        item: &ActionItem,
        content: String,
        alarm_minutes: Vec<u32>,
        now: DateTime<Utc>,
    ) -> ReminderArtifact {
        ReminderArtifact {
            action_item_id: item.id,
            title: item.title.clone(),
            filename: filename("action", &item.title, now),
            content,
            alarm_minutes,
        }
    }
}

/// File name for a calendar artifact: `{prefix}_{safe title}_{YYYYMMDD_HHMM}.ics`.
pub fn filename(prefix: &str, title: &str, now: DateTime<Utc>) -> String {
    let safe: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe: String = safe.trim().replace(' ', "_").chars().take(30).collect();
    format!("{prefix}_{safe}_{}.ics", now.format("%Y%m%d_%H%M"))
}

fn timing_for(due: NaiveDateTime) -> EventTiming {
    if due.time() == NaiveTime::MIN {
        EventTiming::AllDay(due.date())
    } else {
        let start = due.and_utc();
        EventTiming::Timed {
            start,
            end: start + Duration::hours(1),
        }
    }
}

fn ical_priority(priority: Priority) -> u8 {
    match priority {
        Priority::High | Priority::Urgent => 1,
        Priority::Medium => 5,
        Priority::Low => 9,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
