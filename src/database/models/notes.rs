// Database models - Meeting notes and action items
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generated notes for a meeting; one row per meeting, fully replaced on regeneration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingNotes {
    pub meeting_id: String,
    /// Markdown summary
    pub summary_md: String,
    /// Ordered key points
    pub key_points: Vec<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionItemStatus {
    Open,
    Done,
}

impl ActionItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItemStatus::Open => "open",
            ActionItemStatus::Done => "done",
        }
    }
}

impl fmt::Display for ActionItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action item extracted from the transcript
///
/// Regeneration deletes all items for the meeting and reinserts the fresh
/// set; there is no diff/merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub meeting_id: String,
    pub owner_name: Option<String>,
    pub task: String,
    pub status: ActionItemStatus,
    pub source_segment_id: Option<String>,
}
