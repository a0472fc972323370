// Transcripts repository for the meeting-notes worker
// Handles transcript segment persistence and speaker-joined reads

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::models::TranscriptSegment;
use super::DatabaseManager;

/// A segment row joined with its speaker's human-facing name
///
/// Speaker resolution falls back display_name -> label -> "Unknown",
/// matching what the notes generator expects to show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentWithSpeaker {
    pub segment_id: String,
    pub speaker: String,
    pub text: String,
}

impl DatabaseManager {
    /// Insert transcript segments in a single transaction, preserving order
    pub fn insert_transcript_segments(&self, segments: &[TranscriptSegment]) -> Result<()> {
        self.with_connection(|conn| {
            insert_transcript_segments_impl(conn, segments)
        })
    }

    /// All segments for a meeting, ordered by start time
    pub fn get_transcript_segments(&self, meeting_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.with_connection(|conn| {
            get_transcript_segments_impl(conn, meeting_id)
        })
    }

    /// Number of persisted segments for a meeting (idempotency guard)
    pub fn count_transcript_segments(&self, meeting_id: &str) -> Result<i64> {
        self.with_connection(|conn| {
            count_transcript_segments_impl(conn, meeting_id)
        })
    }

    /// Segments with resolved speaker names, ordered by start time
    pub fn get_segments_with_speakers(&self, meeting_id: &str) -> Result<Vec<SegmentWithSpeaker>> {
        self.with_connection(|conn| {
            get_segments_with_speakers_impl(conn, meeting_id)
        })
    }
}

fn insert_transcript_segments_impl(conn: &Connection, segments: &[TranscriptSegment]) -> Result<()> {
    let tx = conn.unchecked_transaction()
        .context("Failed to start transcript insert transaction")?;

    for segment in segments {
        tx.execute(
            r#"
            INSERT INTO transcript_segments (id, meeting_id, speaker_id, start_ms, end_ms, text, confidence)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                segment.id,
                segment.meeting_id,
                segment.speaker_id,
                segment.start_ms,
                segment.end_ms,
                segment.text,
                segment.confidence,
            ],
        ).context("Failed to insert transcript segment")?;
    }

    tx.commit().context("Failed to commit transcript segments")?;
    Ok(())
}

fn get_transcript_segments_impl(conn: &Connection, meeting_id: &str) -> Result<Vec<TranscriptSegment>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, meeting_id, speaker_id, start_ms, end_ms, text, confidence
        FROM transcript_segments
        WHERE meeting_id = ?
        ORDER BY start_ms ASC
        "#
    ).context("Failed to prepare get_transcript_segments query")?;

    let segments = stmt.query_map(params![meeting_id], |row| {
        Ok(TranscriptSegment {
            id: row.get(0)?,
            meeting_id: row.get(1)?,
            speaker_id: row.get(2)?,
            start_ms: row.get(3)?,
            end_ms: row.get(4)?,
            text: row.get(5)?,
            confidence: row.get(6)?,
        })
    }).context("Failed to query transcript segments")?;

    segments.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect transcript segments")
}

fn count_transcript_segments_impl(conn: &Connection, meeting_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM transcript_segments WHERE meeting_id = ?",
        params![meeting_id],
        |row| row.get(0),
    ).context("Failed to count transcript segments")
}

fn get_segments_with_speakers_impl(conn: &Connection, meeting_id: &str) -> Result<Vec<SegmentWithSpeaker>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT ts.id, COALESCE(s.display_name, s.label, 'Unknown') AS speaker, ts.text
        FROM transcript_segments ts
        LEFT JOIN speakers s ON s.id = ts.speaker_id
        WHERE ts.meeting_id = ?
        ORDER BY ts.start_ms ASC
        "#
    ).context("Failed to prepare segments-with-speakers query")?;

    let rows = stmt.query_map(params![meeting_id], |row| {
        Ok(SegmentWithSpeaker {
            segment_id: row.get(0)?,
            speaker: row.get(1)?,
            text: row.get(2)?,
        })
    }).context("Failed to query segments with speakers")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect segments with speakers")
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

    fn make_segment(id: &str, meeting_id: &str, speaker_id: Option<&str>, start_ms: i64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: id.to_string(),
            meeting_id: meeting_id.to_string(),
            speaker_id: speaker_id.map(String::from),
            start_ms,
            end_ms: start_ms + 1000,
            text: text.to_string(),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_insert_and_order_by_start() {
        let db = create_test_db();

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        db.insert_transcript_segments(&[
            make_segment("s2", "m1", None, 5000, "second"),
            make_segment("s1", "m1", None, 0, "first"),
        ]).unwrap();

        let segments = db.get_transcript_segments("m1").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "first");
        assert_eq!(segments[1].text, "second");
        assert_eq!(db.count_transcript_segments("m1").unwrap(), 2);
    }

    #[test]
    fn test_segments_with_speakers_fallbacks() {
        let db = create_test_db();

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        let speaker = db.find_or_create_speaker("m1", "Speaker 1").unwrap();

        db.insert_transcript_segments(&[
            make_segment("s1", "m1", Some(&speaker.id), 0, "hello"),
            make_segment("s2", "m1", None, 1000, "anonymous"),
        ]).unwrap();

        let rows = db.get_segments_with_speakers("m1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].speaker, "Speaker 1");
        // No speaker row joined: the name falls back to "Unknown"
        assert_eq!(rows[1].speaker, "Unknown");
    }
}
