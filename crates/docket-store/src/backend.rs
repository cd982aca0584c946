//! Store trait for pluggable persistence.

use docket_types::{
    ActionItem, ActionStatus, Category, ConversationTurn, MeetingRecord, NewActionItem,
    NewConversationTurn, NewMeeting, RecordId,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Record counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub meetings: u64,
    pub processed_meetings: u64,
    pub action_items: u64,
    pub pending_action_items: u64,
    pub conversation_turns: u64,
}

/// Persistence for meetings, their action items and the conversation log.
///
/// Implementations must be `Send + Sync` and serialize their own writes;
/// manual pipeline runs may overlap with the ingestion loop.
pub trait MeetingStore: Send + Sync {
    /// Insert a meeting, unprocessed.
    fn create_meeting(&self, meeting: &NewMeeting) -> Result<MeetingRecord>;

    /// Attach the semantic index id to a meeting.
    fn set_meeting_index_ref(&self, id: RecordId, vector_id: &str) -> Result<()>;

    /// Mark a meeting processed and attach its summary and category.
    fn complete_meeting(&self, id: RecordId, summary: &str, category: Category) -> Result<()>;

    /// Get a meeting by id. `Ok(None)` if it does not exist.
    fn get_meeting(&self, id: RecordId) -> Result<Option<MeetingRecord>>;

    /// List meetings newest first, optionally filtered by category.
    fn list_meetings(
        &self,
        category: Option<Category>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MeetingRecord>>;

    /// Insert an action item with status `pending`.
    fn create_action_item(&self, item: &NewActionItem) -> Result<ActionItem>;

    /// Attach the semantic index id to an action item.
    fn set_action_item_index_ref(&self, id: RecordId, vector_id: &str) -> Result<()>;

    /// All action items owned by a meeting, in creation order.
    fn action_items_for_meeting(&self, meeting_id: RecordId) -> Result<Vec<ActionItem>>;

    /// Move an action item to a new status.
    fn update_action_item_status(&self, id: RecordId, status: ActionStatus) -> Result<()>;

    /// Append a conversation turn.
    fn record_conversation(&self, turn: &NewConversationTurn) -> Result<ConversationTurn>;

    /// Most recent turns for a chat, newest first.
    fn recent_conversations(&self, chat_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    /// Record counts.
    fn stats(&self) -> Result<StoreStats>;
}
