//! Lead-time computation.

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, Utc};
use docket_types::Priority;

/// Lead time for high-priority items.
pub const HIGH_PRIORITY_MINUTES: u32 = 60;

/// Lead time for low-priority items.
pub const LOW_PRIORITY_MINUTES: u32 = 5;

/// Default lead time for everything else.
pub const DEFAULT_MINUTES: u32 = 15;

/// Extra lead time when the item requires travel.
pub const TRAVEL_BUFFER_MINUTES: u32 = 30;

const URGENT_ESCALATION: &[u32] = &[10080, 4320, 1440, 120];
const MEDIUM_ESCALATION: &[u32] = &[4320, 1440, 240];
const LOW_ESCALATION: &[u32] = &[1440, 120];

/// Lead-time rules for reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Lead time for medium (and unlisted) priorities.
    pub default_minutes: u32,
    /// Added to the lead time when travel is required.
    pub travel_buffer_minutes: u32,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_MINUTES,
            travel_buffer_minutes: TRAVEL_BUFFER_MINUTES,
        }
    }
}

impl ReminderPolicy {
    pub fn new(default_minutes: u32, travel_buffer_minutes: u32) -> Self {
        Self {
            default_minutes,
            travel_buffer_minutes,
        }
    }

    /// Base lead time for a priority, before any travel buffer.
    pub fn base_minutes(&self, priority: Priority) -> u32 {
        match priority {
            Priority::High => HIGH_PRIORITY_MINUTES,
            Priority::Low => LOW_PRIORITY_MINUTES,
            Priority::Medium | Priority::Urgent => self.default_minutes,
        }
    }

    /// Single-alert lead time.
    ///
    /// An explicit lead replaces the priority base; the travel buffer is
    /// added on top either way.
    pub fn lead_minutes(&self, priority: Priority, requires_travel: bool, explicit: Option<u32>) -> u32 {
        explicit.unwrap_or_else(|| self.base_minutes(priority)) + self.travel_minutes(requires_travel)
    }

    /// Travel time recorded on an action item.
    pub fn travel_minutes(&self, requires_travel: bool) -> u32 {
        if requires_travel {
            self.travel_buffer_minutes
        } else {
            0
        }
    }

    /// Escalating alert offsets for deadline-style reminders, earliest first.
    pub fn deadline_offsets(&self, priority: Priority) -> &'static [u32] {
        match priority {
            Priority::High | Priority::Urgent => URGENT_ESCALATION,
            Priority::Medium => MEDIUM_ESCALATION,
            Priority::Low => LOW_ESCALATION,
        }
    }

    /// Whether an item takes the deadline escalation path in batch mode.
    pub fn is_deadline(&self, priority: Priority) -> bool {
        matches!(priority, Priority::High | Priority::Urgent)
    }
}

/// Fallback due time: tomorrow at 09:00.
pub fn default_due(now: DateTime<Utc>) -> NaiveDateTime {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    tomorrow.and_time(nine)
}
