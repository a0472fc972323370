// Speakers repository for the meeting-notes worker
// One row per (meeting, provider label), created lazily during ingestion

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::models::Speaker;
use super::DatabaseManager;

impl DatabaseManager {
    /// Find the speaker for a provider label, inserting it on first sight
    ///
    /// The display name defaults to the label; renames happen elsewhere.
    pub fn find_or_create_speaker(&self, meeting_id: &str, label: &str) -> Result<Speaker> {
        self.with_connection(|conn| {
            find_or_create_speaker_impl(conn, meeting_id, label)
        })
    }

    /// All speakers for a meeting
    pub fn get_speakers(&self, meeting_id: &str) -> Result<Vec<Speaker>> {
        self.with_connection(|conn| {
            get_speakers_impl(conn, meeting_id)
        })
    }
}

fn find_speaker_by_label_impl(conn: &Connection, meeting_id: &str, label: &str) -> Result<Option<Speaker>> {
    let mut stmt = conn.prepare(
        "SELECT id, meeting_id, label, display_name FROM speakers WHERE meeting_id = ? AND label = ?"
    ).context("Failed to prepare speaker lookup")?;

    let result = stmt.query_row(params![meeting_id, label], |row| {
        Ok(Speaker {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            label: row.get(2)?,
            display_name: row.get(3)?,
        })
    });

    match result {
        Ok(speaker) => Ok(Some(speaker)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to look up speaker"),
    }
}

fn find_or_create_speaker_impl(conn: &Connection, meeting_id: &str, label: &str) -> Result<Speaker> {
    if let Some(existing) = find_speaker_by_label_impl(conn, meeting_id, label)? {
        return Ok(existing);
    }

    let speaker = Speaker {
        id: uuid::Uuid::new_v4().to_string(),
        meeting_id: meeting_id.to_string(),
        label: label.to_string(),
        display_name: Some(label.to_string()),
    };

    conn.execute(
        "INSERT INTO speakers (id, meeting_id, label, display_name) VALUES (?1, ?2, ?3, ?4)",
        params![speaker.id, speaker.meeting_id, speaker.label, speaker.display_name],
    ).context("Failed to insert speaker")?;

    Ok(speaker)
}

fn get_speakers_impl(conn: &Connection, meeting_id: &str) -> Result<Vec<Speaker>> {
    let mut stmt = conn.prepare(
        "SELECT id, meeting_id, label, display_name FROM speakers WHERE meeting_id = ? ORDER BY label ASC"
    ).context("Failed to prepare get_speakers query")?;

    let speakers = stmt.query_map(params![meeting_id], |row| {
        Ok(Speaker {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            label: row.get(2)?,
            display_name: row.get(3)?,
        })
    }).context("Failed to query speakers")?;

    speakers.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect speakers")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Meeting;
    use tempfile::tempdir;

    fn create_test_db() -> DatabaseManager {
        let dir = tempdir().unwrap();
        let db_path = dir.into_path().join("test.db");
        DatabaseManager::new(db_path).unwrap()
    }

    #[test]
    fn test_find_or_create_is_stable_per_label() {
        let db = create_test_db();

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        let first = db.find_or_create_speaker("m1", "Speaker 1").unwrap();
        let second = db.find_or_create_speaker("m1", "Speaker 1").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name.as_deref(), Some("Speaker 1"));

        let other = db.find_or_create_speaker("m1", "Speaker 2").unwrap();
        assert_ne!(first.id, other.id);

        assert_eq!(db.get_speakers("m1").unwrap().len(), 2);
    }
}
