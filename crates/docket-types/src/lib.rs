//! Shared types for the Docket meeting assistant.
//!
//! Every crate in the workspace speaks in terms of these records:
//! meetings, the action items extracted from them, and the conversation
//! turns recorded by the ingestion loop.

pub mod action;
pub mod conversation;
pub mod error;
pub mod meeting;
pub mod outcome;

pub use action::{ActionItem, ActionStatus, NewActionItem, Priority};
pub use conversation::{ConversationTurn, NewConversationTurn, TurnKind};
pub use error::ParseEnumError;
pub use meeting::{Category, MeetingRecord, MeetingSource, NewMeeting};
pub use outcome::Outcome;

use chrono::{DateTime, Utc};

/// Row identifier assigned by the persistence layer.
pub type RecordId = i64;

/// Wall-clock timestamp used for creation times.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}
