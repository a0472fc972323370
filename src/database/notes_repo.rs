// Notes repository for the meeting-notes worker
// Meeting notes are one row per meeting (upsert); action items are replaced wholesale

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::models::{ActionItem, ActionItemStatus, MeetingNotes};
use super::DatabaseManager;

impl DatabaseManager {
    /// Insert or fully replace the notes row for a meeting
    pub fn upsert_meeting_notes(&self, meeting_id: &str, summary_md: &str, key_points: &[String]) -> Result<()> {
        self.with_connection(|conn| {
            upsert_meeting_notes_impl(conn, meeting_id, summary_md, key_points)
        })
    }

    /// Get the notes row for a meeting
    pub fn get_meeting_notes(&self, meeting_id: &str) -> Result<Option<MeetingNotes>> {
        self.with_connection(|conn| {
            get_meeting_notes_impl(conn, meeting_id)
        })
    }

    /// Delete all action items for a meeting and insert the fresh set
    pub fn replace_action_items(&self, meeting_id: &str, items: &[ActionItem]) -> Result<()> {
        self.with_connection(|conn| {
            replace_action_items_impl(conn, meeting_id, items)
        })
    }

    /// All action items for a meeting, in insertion order
    pub fn get_action_items(&self, meeting_id: &str) -> Result<Vec<ActionItem>> {
        self.with_connection(|conn| {
            get_action_items_impl(conn, meeting_id)
        })
    }
}

fn upsert_meeting_notes_impl(conn: &Connection, meeting_id: &str, summary_md: &str, key_points: &[String]) -> Result<()> {
    let key_points_json = serde_json::to_string(key_points)
        .context("Failed to serialize key points")?;
    let updated_at = chrono::Utc::now().to_rfc3339();

    conn.execute(
        r#"
        INSERT INTO meeting_notes (meeting_id, summary_md, key_points_json, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(meeting_id) DO UPDATE SET
            summary_md = excluded.summary_md,
            key_points_json = excluded.key_points_json,
            updated_at = excluded.updated_at
        "#,
        params![meeting_id, summary_md, key_points_json, updated_at],
    ).context("Failed to upsert meeting notes")?;

    Ok(())
}

fn get_meeting_notes_impl(conn: &Connection, meeting_id: &str) -> Result<Option<MeetingNotes>> {
    let mut stmt = conn.prepare(
        "SELECT meeting_id, summary_md, key_points_json, updated_at FROM meeting_notes WHERE meeting_id = ?"
    ).context("Failed to prepare get_meeting_notes query")?;

    let result = stmt.query_row(params![meeting_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    });

    match result {
        Ok((meeting_id, summary_md, key_points_json, updated_at)) => {
            let key_points: Vec<String> = serde_json::from_str(&key_points_json)
                .context("Failed to parse key points JSON")?;
            Ok(Some(MeetingNotes {
                meeting_id,
                summary_md,
                key_points,
                updated_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get meeting notes"),
    }
}

fn replace_action_items_impl(conn: &Connection, meeting_id: &str, items: &[ActionItem]) -> Result<()> {
    let tx = conn.unchecked_transaction()
        .context("Failed to start action item transaction")?;

    tx.execute(
        "DELETE FROM action_items WHERE meeting_id = ?",
        params![meeting_id],
    ).context("Failed to delete old action items")?;

    for item in items {
        tx.execute(
            r#"
            INSERT INTO action_items (id, meeting_id, owner_name, task, status, source_segment_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                item.id,
                item.meeting_id,
                item.owner_name,
                item.task,
                item.status.as_str(),
                item.source_segment_id,
            ],
        ).context("Failed to insert action item")?;
    }

    tx.commit().context("Failed to commit action items")?;
    Ok(())
}

fn get_action_items_impl(conn: &Connection, meeting_id: &str) -> Result<Vec<ActionItem>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, meeting_id, owner_name, task, status, source_segment_id
        FROM action_items
        WHERE meeting_id = ?
        ORDER BY rowid ASC
        "#
    ).context("Failed to prepare get_action_items query")?;

    let items = stmt.query_map(params![meeting_id], |row| {
        let status_raw: String = row.get(4)?;
        let status = match status_raw.as_str() {
            "done" => ActionItemStatus::Done,
            _ => ActionItemStatus::Open,
        };
        Ok(ActionItem {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            owner_name: row.get(2)?,
            task: row.get(3)?,
            status,
            source_segment_id: row.get(5)?,
        })
    }).context("Failed to query action items")?;

    items.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect action items")
}
