// Meetings repository for the meeting-notes worker
// Handles lookups and status/audio transitions on meeting rows

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::models::{Meeting, MeetingStatus};
use super::DatabaseManager;

impl DatabaseManager {
    /// Create a new meeting
    pub fn create_meeting(&self, meeting: &Meeting) -> Result<String> {
        self.with_connection(|conn| {
            create_meeting_impl(conn, meeting)
        })
    }

    /// Get a meeting by ID
    pub fn get_meeting(&self, id: &str) -> Result<Option<Meeting>> {
        self.with_connection(|conn| {
            get_meeting_impl(conn, id)
        })
    }

    /// Update a meeting's processing status
    pub fn update_meeting_status(&self, id: &str, status: MeetingStatus) -> Result<()> {
        self.with_connection(|conn| {
            update_meeting_status_impl(conn, id, status)
        })
    }

    /// Rewrite a meeting's audio reference (used by the retention sweep)
    pub fn update_meeting_audio_url(&self, id: &str, audio_url: &str) -> Result<()> {
        self.with_connection(|conn| {
            update_meeting_audio_url_impl(conn, id, audio_url)
        })
    }

    /// Meetings eligible for the audio retention sweep, oldest first
    ///
    /// Terminal status, created before the cutoff, audio not already
    /// tombstoned, capped at the batch size.
    pub fn list_retention_candidates(&self, cutoff_rfc3339: &str, limit: u32) -> Result<Vec<Meeting>> {
        self.with_connection(|conn| {
            list_retention_candidates_impl(conn, cutoff_rfc3339, limit)
        })
    }
}

fn create_meeting_impl(conn: &Connection, meeting: &Meeting) -> Result<String> {
    conn.execute(
        r#"
        INSERT INTO meetings (id, title, status, audio_url, created_at, started_at, duration_sec)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            meeting.id,
            meeting.title,
            meeting.status.as_str(),
            meeting.audio_url,
            meeting.created_at,
            meeting.started_at,
            meeting.duration_sec,
        ],
    ).context("Failed to create meeting")?;

    Ok(meeting.id.clone())
}

fn row_to_meeting(row: &rusqlite::Row<'_>) -> rusqlite::Result<Meeting> {
    let status_raw: String = row.get(2)?;
    let status = status_raw.parse::<MeetingStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Meeting {
        id: row.get(0)?,
        title: row.get(1)?,
        status,
        audio_url: row.get(3)?,
        created_at: row.get(4)?,
        started_at: row.get(5)?,
        duration_sec: row.get(6)?,
    })
}

fn get_meeting_impl(conn: &Connection, id: &str) -> Result<Option<Meeting>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, title, status, audio_url, created_at, started_at, duration_sec
        FROM meetings WHERE id = ?
        "#
    ).context("Failed to prepare get_meeting query")?;

    let result = stmt.query_row(params![id], row_to_meeting);

    match result {
        Ok(meeting) => Ok(Some(meeting)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get meeting"),
    }
}

fn update_meeting_status_impl(conn: &Connection, id: &str, status: MeetingStatus) -> Result<()> {
    conn.execute(
        "UPDATE meetings SET status = ? WHERE id = ?",
        params![status.as_str(), id],
    ).context("Failed to update meeting status")?;

    Ok(())
}

fn update_meeting_audio_url_impl(conn: &Connection, id: &str, audio_url: &str) -> Result<()> {
    conn.execute(
        "UPDATE meetings SET audio_url = ? WHERE id = ?",
        params![audio_url, id],
    ).context("Failed to update meeting audio url")?;

    Ok(())
}

fn list_retention_candidates_impl(conn: &Connection, cutoff_rfc3339: &str, limit: u32) -> Result<Vec<Meeting>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, title, status, audio_url, created_at, started_at, duration_sec
        FROM meetings
        WHERE created_at < ?1
          AND status IN ('completed', 'failed')
          AND audio_url NOT LIKE 'deleted://%'
        ORDER BY created_at ASC
        LIMIT ?2
        "#
    ).context("Failed to prepare retention candidates query")?;

    let meetings = stmt.query_map(params![cutoff_rfc3339, limit], row_to_meeting)
        .context("Failed to query retention candidates")?;

    meetings.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect retention candidates")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_db() -> DatabaseManager {
        let dir = tempdir().unwrap();
        let db_path = dir.into_path().join("test.db");
        DatabaseManager::new(db_path).unwrap()
    }

    #[test]
    fn test_create_and_get_meeting() {
        let db = create_test_db();

        let meeting = Meeting::new("m1".to_string(), "Standup".to_string(), "uploads/a.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        let loaded = db.get_meeting("m1").unwrap().unwrap();
        assert_eq!(loaded.title, "Standup");
        assert_eq!(loaded.status, MeetingStatus::Uploaded);
        assert_eq!(loaded.audio_url, "uploads/a.m4a");

        assert!(db.get_meeting("missing").unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let db = create_test_db();

        let meeting = Meeting::new("m2".to_string(), "Planning".to_string(), "uploads/b.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        db.update_meeting_status("m2", MeetingStatus::Processing).unwrap();
        assert_eq!(db.get_meeting("m2").unwrap().unwrap().status, MeetingStatus::Processing);

        db.update_meeting_status("m2", MeetingStatus::Completed).unwrap();
        assert_eq!(db.get_meeting("m2").unwrap().unwrap().status, MeetingStatus::Completed);
    }

    #[test]
    fn test_retention_candidates_filtering() {
        let db = create_test_db();

        let mut old_completed = Meeting::new("old".to_string(), "Old".to_string(), "uploads/old.m4a".to_string());
        old_completed.created_at = "2020-01-01T00:00:00+00:00".to_string();
        old_completed.status = MeetingStatus::Completed;
        db.create_meeting(&old_completed).unwrap();

        let mut old_uploaded = Meeting::new("pending".to_string(), "Pending".to_string(), "uploads/p.m4a".to_string());
        old_uploaded.created_at = "2020-01-02T00:00:00+00:00".to_string();
        db.create_meeting(&old_uploaded).unwrap();

        let mut old_tombstoned = Meeting::new("gone".to_string(), "Gone".to_string(), "deleted://uploads/g.m4a".to_string());
        old_tombstoned.created_at = "2020-01-03T00:00:00+00:00".to_string();
        old_tombstoned.status = MeetingStatus::Failed;
        db.create_meeting(&old_tombstoned).unwrap();

        let recent = Meeting::new("new".to_string(), "New".to_string(), "uploads/n.m4a".to_string());
        db.create_meeting(&recent).unwrap();

        let candidates = db.list_retention_candidates("2021-01-01T00:00:00+00:00", 100).unwrap();
        let ids: Vec<&str> = candidates.iter().map(|m| m.id.as_str()).collect();
        // Only the old terminal meeting with live audio qualifies
        assert_eq!(ids, vec!["old"]);
    }

    #[test]
    fn test_retention_candidates_order_and_limit() {
        let db = create_test_db();

        for (id, created_at) in [("c", "2020-03-01T00:00:00+00:00"), ("a", "2020-01-01T00:00:00+00:00"), ("b", "2020-02-01T00:00:00+00:00")] {
            let mut meeting = Meeting::new(id.to_string(), id.to_string(), format!("uploads/{}.m4a", id));
            meeting.created_at = created_at.to_string();
            meeting.status = MeetingStatus::Completed;
            db.create_meeting(&meeting).unwrap();
        }

        let candidates = db.list_retention_candidates("2021-01-01T00:00:00+00:00", 2).unwrap();
        let ids: Vec<&str> = candidates.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
