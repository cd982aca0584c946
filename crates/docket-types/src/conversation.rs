//! Conversation log entries.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::{RecordId, Timestamp};

/// What kind of exchange a turn was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Query,
    Meeting,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Query => "query",
            TurnKind::Meeting => "meeting",
        }
    }
}

impl FromStr for TurnKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(TurnKind::Query),
            "meeting" => Ok(TurnKind::Meeting),
            _ => Err(ParseEnumError::new("turn kind", s)),
        }
    }
}

/// Input for appending to the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversationTurn {
    pub chat_id: String,
    pub input: String,
    pub output: String,
    pub kind: TurnKind,
    pub duration: Duration,
}

/// A recorded exchange with a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: RecordId,
    pub chat_id: String,
    pub input: String,
    pub output: String,
    pub kind: TurnKind,
    pub duration: Duration,
    pub created_at: Timestamp,
}
