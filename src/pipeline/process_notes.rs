// Notes processing pipeline
// Reads the transcript, generates notes, and replaces the persisted set

use anyhow::Result;

use crate::database::{ActionItem, ActionItemStatus, DatabaseManager};
use crate::notes::{NoteSegment, NotesGenerator};

/// Generate and persist notes for one meeting
///
/// Runs chained after every successful audio job, and independently for
/// manual regeneration. Notes are upserted; action items are deleted and
/// reinserted wholesale.
pub async fn process_meeting_notes(
    db: &DatabaseManager,
    generator: &NotesGenerator,
    meeting_id: &str,
) -> Result<()> {
    let rows = db.get_segments_with_speakers(meeting_id)?;

    let segments: Vec<NoteSegment> = rows
        .into_iter()
        .map(|row| NoteSegment {
            id: row.segment_id,
            speaker: row.speaker,
            text: row.text,
        })
        .collect();

    let output = generator.generate(&segments).await;

    db.upsert_meeting_notes(meeting_id, &output.summary_md, &output.key_points)?;

    let items: Vec<ActionItem> = output
        .action_items
        .into_iter()
        .map(|draft| ActionItem {
            id: uuid::Uuid::new_v4().to_string(),
            meeting_id: meeting_id.to_string(),
            owner_name: draft.owner_name,
            task: draft.task,
            status: ActionItemStatus::Open,
            source_segment_id: draft.source_segment_id,
        })
        .collect();

    db.replace_action_items(meeting_id, &items)?;

    log::info!(
        "Notes persisted for meeting {} ({} action items)",
        meeting_id,
        items.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NotesConfig, NotesProviderKind};
    use crate::database::{Meeting, TranscriptSegment};
    use tempfile::tempdir;

    fn create_test_db() -> DatabaseManager {
        let dir = tempdir().unwrap();
        let db_path = dir.into_path().join("test.db");
        DatabaseManager::new(db_path).unwrap()
    }

    fn heuristic_generator() -> NotesGenerator {
        NotesGenerator::new(&NotesConfig {
            provider: NotesProviderKind::Heuristic,
            ollama_endpoint: "http://localhost:11434/api/generate".to_string(),
            ollama_model: "llama3.1".to_string(),
            ollama_timeout_ms: 1000,
        })
    }

    fn seed_meeting_with_transcript(db: &DatabaseManager, meeting_id: &str) {
        let meeting = Meeting::new(meeting_id.to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        let speaker = db.find_or_create_speaker(meeting_id, "Speaker 1").unwrap();
        db.insert_transcript_segments(&[
            TranscriptSegment {
                id: "s1".to_string(),
                meeting_id: meeting_id.to_string(),
                speaker_id: Some(speaker.id.clone()),
                start_ms: 0,
                end_ms: 4000,
                text: "We will ship Friday".to_string(),
                confidence: Some(0.9),
            },
            TranscriptSegment {
                id: "s2".to_string(),
                meeting_id: meeting_id.to_string(),
                speaker_id: Some(speaker.id),
                start_ms: 4000,
                end_ms: 8000,
                text: "Nice weather today".to_string(),
                confidence: Some(0.9),
            },
        ]).unwrap();
    }

    #[tokio::test]
    async fn test_notes_and_action_items_persisted() {
        let db = create_test_db();
        let generator = heuristic_generator();

        seed_meeting_with_transcript(&db, "m1");
        process_meeting_notes(&db, &generator, "m1").await.unwrap();

        let notes = db.get_meeting_notes("m1").unwrap().unwrap();
        assert!(notes.summary_md.starts_with("## Summary\n"));
        assert!(notes.summary_md.contains("Speaker 1: We will ship Friday"));
        assert_eq!(notes.key_points, vec!["We will ship Friday".to_string(), "Nice weather today".to_string()]);

        let items = db.get_action_items("m1").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task, "We will ship Friday");
        assert_eq!(items[0].owner_name.as_deref(), Some("Speaker 1"));
        assert_eq!(items[0].source_segment_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_prior_output() {
        let db = create_test_db();
        let generator = heuristic_generator();

        seed_meeting_with_transcript(&db, "m1");
        process_meeting_notes(&db, &generator, "m1").await.unwrap();
        let first_items = db.get_action_items("m1").unwrap();

        process_meeting_notes(&db, &generator, "m1").await.unwrap();
        let second_items = db.get_action_items("m1").unwrap();

        // Same content, fresh rows: the old set was deleted, not merged
        assert_eq!(second_items.len(), first_items.len());
        assert_ne!(second_items[0].id, first_items[0].id);

        // Still exactly one notes row
        assert!(db.get_meeting_notes("m1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_transcript_yields_placeholder_notes() {
        let db = create_test_db();
        let generator = heuristic_generator();

        let meeting = Meeting::new("m2".to_string(), "Empty".to_string(), "uploads/b.m4a".to_string());
        db.create_meeting(&meeting).unwrap();

        process_meeting_notes(&db, &generator, "m2").await.unwrap();

        let notes = db.get_meeting_notes("m2").unwrap().unwrap();
        assert_eq!(notes.summary_md, "## Summary\nNo transcript available.");
        assert!(notes.key_points.is_empty());
        assert!(db.get_action_items("m2").unwrap().is_empty());
    }
}
