//! Meeting records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::{RecordId, Timestamp};

/// Topic category assigned to a meeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Health,
    Finance,
    Education,
    #[default]
    Other,
}

impl Category {
    /// All categories, in the order they are offered to the model.
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Health,
        Category::Finance,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Health => "health",
            Category::Finance => "finance",
            Category::Education => "education",
            Category::Other => "other",
        }
    }

    /// Parse loosely: trims and lowercases, falls back to `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        s.trim().to_lowercase().parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "health" => Ok(Category::Health),
            "finance" => Ok(Category::Finance),
            "education" => Ok(Category::Education),
            "other" => Ok(Category::Other),
            _ => Err(ParseEnumError::new("category", s)),
        }
    }
}

/// Where the meeting content came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingSource {
    #[default]
    Manual,
    Signal,
    Telegram,
}

impl MeetingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingSource::Manual => "manual",
            MeetingSource::Signal => "signal",
            MeetingSource::Telegram => "telegram",
        }
    }
}

impl FromStr for MeetingSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(MeetingSource::Manual),
            "signal" => Ok(MeetingSource::Signal),
            "telegram" => Ok(MeetingSource::Telegram),
            _ => Err(ParseEnumError::new("meeting source", s)),
        }
    }
}

/// Input for creating a meeting row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub chat_id: Option<String>,
    pub title: String,
    pub category: Category,
    pub content: String,
    pub participants: Vec<String>,
    pub meeting_date: Timestamp,
    pub source: MeetingSource,
}

impl NewMeeting {
    /// Create a new meeting input dated now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            title: title.into(),
            category: Category::Other,
            content: content.into(),
            participants: Vec::new(),
            meeting_date: crate::now(),
            source: MeetingSource::Manual,
        }
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_participants(mut self, participants: Vec<String>) -> Self {
        self.participants = participants;
        self
    }

    pub fn with_source(mut self, source: MeetingSource) -> Self {
        self.source = source;
        self
    }
}

/// A stored meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: RecordId,
    pub chat_id: Option<String>,
    pub title: String,
    pub category: Category,
    pub content: String,
    pub summary: Option<String>,
    pub participants: Vec<String>,
    pub meeting_date: Timestamp,
    /// Set once summary and action items have been produced.
    pub processed: bool,
    pub source: MeetingSource,
    /// Entry id in the semantic index, once indexed.
    pub vector_id: Option<String>,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lenient_parse() {
        assert_eq!(Category::parse_lenient("  Work\n"), Category::Work);
        assert_eq!(Category::parse_lenient("HEALTH"), Category::Health);
        assert_eq!(Category::parse_lenient("sports"), Category::Other);
        assert_eq!(Category::parse_lenient(""), Category::Other);
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Finance).unwrap();
        assert_eq!(json, "\"finance\"");
        let parsed: Category = serde_json::from_str("\"education\"").unwrap();
        assert_eq!(parsed, Category::Education);
    }

    #[test]
    fn test_new_meeting_builder() {
        let meeting = NewMeeting::new("Standup", "notes")
            .with_chat_id("chat-1")
            .with_category(Category::Work)
            .with_participants(vec!["alice".into()]);
        assert_eq!(meeting.chat_id.as_deref(), Some("chat-1"));
        assert_eq!(meeting.category, Category::Work);
        assert_eq!(meeting.source, MeetingSource::Manual);
    }
}
