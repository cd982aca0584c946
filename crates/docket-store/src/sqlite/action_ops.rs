//! Action item operations.

use docket_types::{ActionItem, ActionStatus, NewActionItem, RecordId};
use rusqlite::params;
use tracing::debug;

use crate::error::{Result, StoreError};

use super::{NAIVE_FORMAT, SqliteStore, parse_enum, parse_naive};

const ACTION_COLUMNS: &str = "id, meeting_id, chat_id, title, description, due_date, priority, \
     status, requires_travel, travel_time_minutes, reminder_minutes, vector_id";

impl SqliteStore {
    /// Insert a new pending action item.
    pub fn insert_action_item(&self, item: &NewActionItem) -> Result<ActionItem> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO action_items (meeting_id, chat_id, title, description, due_date,
                                      priority, status, requires_travel,
                                      travel_time_minutes, reminder_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8, ?9, ?10)
            "#,
            params![
                item.meeting_id,
                item.chat_id,
                item.title,
                item.description,
                item.due_date.map(|d| d.format(NAIVE_FORMAT).to_string()),
                item.priority.as_str(),
                item.requires_travel,
                item.travel_time_minutes,
                item.reminder_minutes,
                docket_types::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Inserted action item {}", id);
        Ok(ActionItem {
            id,
            meeting_id: item.meeting_id,
            chat_id: item.chat_id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            due_date: item.due_date,
            priority: item.priority,
            status: ActionStatus::Pending,
            requires_travel: item.requires_travel,
            travel_time_minutes: item.travel_time_minutes,
            reminder_minutes: item.reminder_minutes,
            vector_id: None,
        })
    }

    /// Attach a semantic index id.
    pub fn update_action_item_vector_id(&self, id: RecordId, vector_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "UPDATE action_items SET vector_id = ?2 WHERE id = ?1",
            params![id, vector_id],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Action item {}", id)));
        }
        Ok(())
    }

    /// Change an action item's status.
    pub fn set_action_item_status(&self, id: RecordId, status: ActionStatus) -> Result<()> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "UPDATE action_items SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Action item {}", id)));
        }
        debug!("Action item {} -> {}", id, status);
        Ok(())
    }

    /// Action items of one meeting, oldest first.
    pub fn fetch_action_items_for_meeting(&self, meeting_id: RecordId) -> Result<Vec<ActionItem>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM action_items WHERE meeting_id = ?1 ORDER BY id"
        ))?;
        let mut rows = stmt.query(params![meeting_id])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(Self::row_to_action_item(row)?);
        }
        Ok(items)
    }

    pub(crate) fn row_to_action_item(row: &rusqlite::Row) -> Result<ActionItem> {
        let due_date: Option<String> = row.get(5)?;
        let priority: String = row.get(6)?;
        let status: String = row.get(7)?;

        Ok(ActionItem {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            chat_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            due_date: due_date.as_deref().map(parse_naive).transpose()?,
            priority: parse_enum(&priority)?,
            status: parse_enum(&status)?,
            requires_travel: row.get(8)?,
            travel_time_minutes: row.get(9)?,
            reminder_minutes: row.get(10)?,
            vector_id: row.get(11)?,
        })
    }
}
