//! SQLite store implementation.
//!
//! One connection behind a mutex, WAL mode, schema versioned through
//! `PRAGMA user_version`.

mod action_ops;
mod conversation_ops;
mod meeting_ops;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use docket_types::{
    ActionItem, ActionStatus, Category, ConversationTurn, MeetingRecord, NewActionItem,
    NewConversationTurn, NewMeeting, RecordId,
};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::backend::{MeetingStore, StoreStats};
use crate::error::{Result, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Schema Version
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version for migrations.
const SCHEMA_VERSION: i32 = 2;

/// Storage format for floating due dates.
pub(crate) const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// Meeting store backed by SQLite.
pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        info!("Meeting store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        debug!("In-memory store created");
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::create_schema(&conn)
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let current_version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if current_version >= SCHEMA_VERSION {
            debug!("Schema up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating schema from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                content TEXT NOT NULL,
                summary TEXT,
                participants TEXT NOT NULL DEFAULT '[]',
                meeting_date TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL,
                vector_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_meetings_created_at
                ON meetings(created_at);

            CREATE TABLE IF NOT EXISTS action_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER REFERENCES meetings(id) ON DELETE CASCADE,
                chat_id TEXT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                due_date TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'pending',
                requires_travel INTEGER NOT NULL DEFAULT 0,
                travel_time_minutes INTEGER NOT NULL DEFAULT 0,
                reminder_minutes INTEGER NOT NULL DEFAULT 15,
                vector_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_action_items_meeting
                ON action_items(meeting_id);

            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL,
                input TEXT NOT NULL,
                output TEXT NOT NULL,
                kind TEXT NOT NULL,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        if current_version < 2 {
            Self::migrate_v2(conn)?;
        }

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        info!("Schema created (version {})", SCHEMA_VERSION);
        Ok(())
    }

    /// Migration v2: index conversations and action item status.
    fn migrate_v2(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_conversations_chat
                ON conversations(chat_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_action_items_status
                ON action_items(status);
            "#,
        )?;
        debug!("Migration v2 complete");
        Ok(())
    }

    /// Record counts.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        };

        Ok(StoreStats {
            meetings: count("SELECT COUNT(*) FROM meetings")?,
            processed_meetings: count("SELECT COUNT(*) FROM meetings WHERE processed = 1")?,
            action_items: count("SELECT COUNT(*) FROM action_items")?,
            pending_action_items: count(
                "SELECT COUNT(*) FROM action_items WHERE status = 'pending'",
            )?,
            conversation_turns: count("SELECT COUNT(*) FROM conversations")?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row decoding helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

pub(crate) fn parse_naive(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

pub(crate) fn parse_enum<T>(s: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// MeetingStore
// ─────────────────────────────────────────────────────────────────────────────

impl MeetingStore for SqliteStore {
    fn create_meeting(&self, meeting: &NewMeeting) -> Result<MeetingRecord> {
        self.insert_meeting(meeting)
    }

    fn set_meeting_index_ref(&self, id: RecordId, vector_id: &str) -> Result<()> {
        self.update_meeting_vector_id(id, vector_id)
    }

    fn complete_meeting(&self, id: RecordId, summary: &str, category: Category) -> Result<()> {
        self.mark_meeting_processed(id, summary, category)
    }

    fn get_meeting(&self, id: RecordId) -> Result<Option<MeetingRecord>> {
        self.fetch_meeting(id)
    }

    fn list_meetings(
        &self,
        category: Option<Category>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MeetingRecord>> {
        self.fetch_meetings(category, limit, offset)
    }

    fn create_action_item(&self, item: &NewActionItem) -> Result<ActionItem> {
        self.insert_action_item(item)
    }

    fn set_action_item_index_ref(&self, id: RecordId, vector_id: &str) -> Result<()> {
        self.update_action_item_vector_id(id, vector_id)
    }

    fn action_items_for_meeting(&self, meeting_id: RecordId) -> Result<Vec<ActionItem>> {
        self.fetch_action_items_for_meeting(meeting_id)
    }

    fn update_action_item_status(&self, id: RecordId, status: ActionStatus) -> Result<()> {
        self.set_action_item_status(id, status)
    }

    fn record_conversation(&self, turn: &NewConversationTurn) -> Result<ConversationTurn> {
        self.insert_conversation(turn)
    }

    fn recent_conversations(&self, chat_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        self.fetch_recent_conversations(chat_id, limit)
    }

    fn stats(&self) -> Result<StoreStats> {
        SqliteStore::stats(self)
    }
}
