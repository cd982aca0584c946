//! Conversation log operations. Append-only.

use std::time::Duration;

use docket_types::{ConversationTurn, NewConversationTurn};
use rusqlite::params;
use tracing::debug;

use crate::error::Result;

use super::{SqliteStore, parse_enum, parse_timestamp};

impl SqliteStore {
    /// Append a conversation turn.
    pub fn insert_conversation(&self, turn: &NewConversationTurn) -> Result<ConversationTurn> {
        let conn = self.conn.lock();
        let created_at = docket_types::now();
        let duration_ms = i64::try_from(turn.duration.as_millis()).unwrap_or(i64::MAX);

        conn.execute(
            r#"
            INSERT INTO conversations (chat_id, input, output, kind, duration_ms, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                turn.chat_id,
                turn.input,
                turn.output,
                turn.kind.as_str(),
                duration_ms,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Recorded conversation turn {}", id);
        Ok(ConversationTurn {
            id,
            chat_id: turn.chat_id.clone(),
            input: turn.input.clone(),
            output: turn.output.clone(),
            kind: turn.kind,
            duration: turn.duration,
            created_at,
        })
    }

    /// Most recent turns for a chat, newest first.
    pub fn fetch_recent_conversations(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            r#"
            SELECT id, chat_id, input, output, kind, duration_ms, created_at
            FROM conversations
            WHERE chat_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;
        let mut rows = stmt.query(params![chat_id, limit as i64])?;

        let mut turns = Vec::new();
        while let Some(row) = rows.next()? {
            let kind: String = row.get(4)?;
            let duration_ms: i64 = row.get(5)?;
            let created_at: String = row.get(6)?;
            turns.push(ConversationTurn {
                id: row.get(0)?,
                chat_id: row.get(1)?,
                input: row.get(2)?,
                output: row.get(3)?,
                kind: parse_enum(&kind)?,
                duration: Duration::from_millis(duration_ms.max(0) as u64),
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(turns)
    }
}
