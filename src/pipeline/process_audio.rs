// Audio processing pipeline
// Turns an uploaded audio object into persisted speakers and transcript segments

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::{DatabaseManager, MeetingStatus, TranscriptSegment};
use crate::transcription::{ProviderSegment, TranscriptionProvider};

/// Process one meeting's audio into transcript segments
///
/// Safe to deliver redundantly: a missing meeting is a vacuous success, and
/// a meeting that already has segments is only flipped to completed. Any
/// error propagates to the job scheduler for retry.
pub async fn process_meeting_audio(
    db: &DatabaseManager,
    provider: &Arc<dyn TranscriptionProvider>,
    meeting_id: &str,
) -> Result<()> {
    let Some(meeting) = db.get_meeting(meeting_id)? else {
        // Stale enqueue for a meeting that no longer exists
        log::warn!("Audio job for unknown meeting {}, skipping", meeting_id);
        return Ok(());
    };

    // Idempotency guard: segments already persisted means a previous attempt
    // (or a duplicate delivery) got here first
    if db.count_transcript_segments(meeting_id)? > 0 {
        db.update_meeting_status(meeting_id, MeetingStatus::Completed)?;
        log::info!("Meeting {} already transcribed, marked completed", meeting_id);
        return Ok(());
    }

    db.update_meeting_status(meeting_id, MeetingStatus::Processing)?;

    let segments = provider
        .transcribe_and_diarize(&meeting.audio_url)
        .await
        .with_context(|| format!("Transcription failed for meeting {}", meeting_id))?;

    log::info!(
        "Provider '{}' returned {} segments for meeting {}",
        provider.provider_name(),
        segments.len(),
        meeting_id
    );

    persist_segments(db, meeting_id, &segments)?;

    db.update_meeting_status(meeting_id, MeetingStatus::Completed)?;
    Ok(())
}

/// Resolve speakers lazily and insert segments in provider order
fn persist_segments(db: &DatabaseManager, meeting_id: &str, segments: &[ProviderSegment]) -> Result<()> {
    let mut speaker_ids: HashMap<String, String> = HashMap::new();

    let mut rows = Vec::with_capacity(segments.len());
    for segment in segments {
        let speaker_id = match speaker_ids.get(&segment.speaker_label) {
            Some(id) => id.clone(),
            None => {
                let speaker = db.find_or_create_speaker(meeting_id, &segment.speaker_label)?;
                speaker_ids.insert(segment.speaker_label.clone(), speaker.id.clone());
                speaker.id
            }
        };

        rows.push(TranscriptSegment {
            id: uuid::Uuid::new_v4().to_string(),
            meeting_id: meeting_id.to_string(),
            speaker_id: Some(speaker_id),
            start_ms: segment.start_ms,
            end_ms: segment.end_ms,
            text: segment.text.clone(),
            confidence: segment.confidence,
        });
    }

    db.insert_transcript_segments(&rows)
}
