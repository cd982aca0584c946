//! Meeting CRUD operations.

use docket_types::{Category, MeetingRecord, NewMeeting, RecordId};
use rusqlite::params;
use tracing::debug;

use crate::error::{Result, StoreError};

use super::{SqliteStore, parse_enum, parse_timestamp};

const MEETING_COLUMNS: &str = "id, chat_id, title, category, content, summary, participants, \
     meeting_date, processed, source, vector_id, created_at";

impl SqliteStore {
    /// Insert a new, unprocessed meeting.
    pub fn insert_meeting(&self, meeting: &NewMeeting) -> Result<MeetingRecord> {
        let conn = self.conn.lock();

        let participants_json = serde_json::to_string(&meeting.participants)?;
        let created_at = docket_types::now();

        conn.execute(
            r#"
            INSERT INTO meetings (chat_id, title, category, content, participants,
                                  meeting_date, processed, source, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
            "#,
            params![
                meeting.chat_id,
                meeting.title,
                meeting.category.as_str(),
                meeting.content,
                participants_json,
                meeting.meeting_date.to_rfc3339(),
                meeting.source.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Inserted meeting {}", id);
        Ok(MeetingRecord {
            id,
            chat_id: meeting.chat_id.clone(),
            title: meeting.title.clone(),
            category: meeting.category,
            content: meeting.content.clone(),
            summary: None,
            participants: meeting.participants.clone(),
            meeting_date: meeting.meeting_date,
            processed: false,
            source: meeting.source,
            vector_id: None,
            created_at,
        })
    }

    /// Attach a semantic index id.
    pub fn update_meeting_vector_id(&self, id: RecordId, vector_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "UPDATE meetings SET vector_id = ?2 WHERE id = ?1",
            params![id, vector_id],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Meeting {}", id)));
        }
        Ok(())
    }

    /// Set summary and category and flag the meeting processed.
    pub fn mark_meeting_processed(
        &self,
        id: RecordId,
        summary: &str,
        category: Category,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            r#"
            UPDATE meetings
            SET processed = 1, summary = ?2, category = ?3
            WHERE id = ?1
            "#,
            params![id, summary, category.as_str()],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Meeting {}", id)));
        }
        debug!("Meeting {} processed", id);
        Ok(())
    }

    /// Get a meeting by id.
    pub fn fetch_meeting(&self, id: RecordId) -> Result<Option<MeetingRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_meeting(row)?))
        } else {
            Ok(None)
        }
    }

    /// List meetings newest first.
    pub fn fetch_meetings(
        &self,
        category: Option<Category>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MeetingRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {MEETING_COLUMNS}
            FROM meetings
            WHERE ?1 IS NULL OR category = ?1
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))?;

        let mut rows = stmt.query(params![
            category.map(|c| c.as_str()),
            limit as i64,
            offset as i64
        ])?;

        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(Self::row_to_meeting(row)?);
        }

        Ok(meetings)
    }

    pub(crate) fn row_to_meeting(row: &rusqlite::Row) -> Result<MeetingRecord> {
        let category: String = row.get(3)?;
        let participants_json: String = row.get(6)?;
        let meeting_date: String = row.get(7)?;
        let processed: i64 = row.get(8)?;
        let source: String = row.get(9)?;
        let created_at: String = row.get(11)?;

        Ok(MeetingRecord {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            title: row.get(2)?,
            category: parse_enum(&category)?,
            content: row.get(4)?,
            summary: row.get(5)?,
            participants: serde_json::from_str(&participants_json)?,
            meeting_date: parse_timestamp(&meeting_date)?,
            processed: processed != 0,
            source: parse_enum(&source)?,
            vector_id: row.get(10)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}
