// Concrete job handlers for the two queues

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::consumer::JobHandler;
use crate::database::MeetingStatus;
use crate::pipeline::{process_meeting_audio, process_meeting_notes};
use crate::state::WorkerState;

/// Handler for the audio queue
///
/// Chains directly into notes generation, so a single enqueue produces both
/// the transcript and the notes.
pub struct AudioJobHandler {
    state: Arc<WorkerState>,
}

impl AudioJobHandler {
    pub fn new(state: Arc<WorkerState>) -> Arc<Self> {
        Arc::new(Self { state })
    }
}

#[async_trait]
impl JobHandler for AudioJobHandler {
    async fn execute(&self, meeting_id: &str) -> Result<()> {
        process_meeting_audio(&self.state.db, &self.state.transcription, meeting_id).await?;
        process_meeting_notes(&self.state.db, &self.state.notes, meeting_id).await
    }

    async fn on_exhausted(&self, meeting_id: &str) {
        // Without this, a meeting whose retries ran out would sit at
        // processing forever with nothing left to advance it
        if let Err(e) = self.state.db.update_meeting_status(meeting_id, MeetingStatus::Failed) {
            log::error!("Failed to mark meeting {} failed after retry exhaustion: {:#}", meeting_id, e);
        } else {
            log::warn!("Meeting {} marked failed after exhausted audio retries", meeting_id);
        }
    }
}

/// Handler for the notes queue (manual regeneration)
pub struct NotesJobHandler {
    state: Arc<WorkerState>,
}

impl NotesJobHandler {
    pub fn new(state: Arc<WorkerState>) -> Arc<Self> {
        Arc::new(Self { state })
    }
}

#[async_trait]
impl JobHandler for NotesJobHandler {
    async fn execute(&self, meeting_id: &str) -> Result<()> {
        process_meeting_notes(&self.state.db, &self.state.notes, meeting_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, NotesConfig, NotesProviderKind, StorageConfig, TranscriptionProviderKind};
    use crate::config::{DeepgramConfig, LocalAsrConfig, RetentionConfig};
    use crate::database::{DatabaseManager, Meeting, QueueName};
    use crate::notes::NotesGenerator;
    use crate::queue::consumer::run_pending_job_once_at;
    use crate::storage::{AudioObjectStore, StorageError};
    use crate::transcription::{MockTranscriptionProvider, ProviderSegment, TranscriptionError, TranscriptionProvider};
    use tempfile::tempdir;

    struct NullStore;

    #[async_trait]
    impl AudioObjectStore for NullStore {
        async fn presign_download(&self, object_key: &str) -> Result<String, StorageError> {
            Ok(format!("https://storage.example/{}", object_key))
        }

        async fn delete_object(&self, _object_key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TranscriptionProvider for FailingProvider {
        fn provider_name(&self) -> &'static str {
            "failing"
        }

        async fn transcribe_and_diarize(
            &self,
            _audio_object_key: &str,
        ) -> Result<Vec<ProviderSegment>, TranscriptionError> {
            Err(TranscriptionError::RequestFailed("unreachable".to_string()))
        }
    }

    fn test_config() -> Config {
        Config {
            database_path: std::path::PathBuf::from("unused.db"),
            queue_poll_interval_ms: 500,
            transcription_provider: TranscriptionProviderKind::Mock,
            storage: StorageConfig {
                gateway_url: None,
                gateway_token: None,
                signed_download_expires_sec: 900,
            },
            retention: RetentionConfig {
                enabled: false,
                days: 30,
                sweep_minutes: 60,
                batch_size: 100,
            },
            deepgram: DeepgramConfig {
                api_key: None,
                model: "nova-2".to_string(),
                language: None,
                endpoint: "https://api.deepgram.com/v1/listen".to_string(),
            },
            local_asr: LocalAsrConfig {
                endpoint: None,
                api_key: None,
                timeout_ms: 120_000,
            },
            notes: NotesConfig {
                provider: NotesProviderKind::Heuristic,
                ollama_endpoint: "http://localhost:11434/api/generate".to_string(),
                ollama_model: "llama3.1".to_string(),
                ollama_timeout_ms: 120_000,
            },
        }
    }

    fn make_state(provider: Arc<dyn TranscriptionProvider>) -> (Arc<WorkerState>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Arc::new(DatabaseManager::new(dir.path().join("test.db")).unwrap());
        let config = Arc::new(test_config());
        let state = WorkerState::new(
            db,
            Arc::new(NullStore),
            provider,
            Arc::new(NotesGenerator::new(&config.notes)),
            config,
        );
        (state, dir)
    }

    #[tokio::test]
    async fn test_audio_job_chains_into_notes() {
        let (state, _dir) = make_state(Arc::new(MockTranscriptionProvider));

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        state.db.create_meeting(&meeting).unwrap();

        let job = state.db.enqueue_job(QueueName::ProcessMeetingAudio, "m1").unwrap();
        let handler: Arc<dyn JobHandler> = AudioJobHandler::new(state.clone());

        let ran = run_pending_job_once_at(&state.db, QueueName::ProcessMeetingAudio, &handler, job.run_at_ms)
            .await
            .unwrap();
        assert!(ran);

        // One enqueue produced transcript and notes
        assert_eq!(state.db.count_transcript_segments("m1").unwrap(), 3);
        assert!(state.db.get_meeting_notes("m1").unwrap().is_some());
        assert_eq!(state.db.get_meeting("m1").unwrap().unwrap().status, MeetingStatus::Completed);
    }

    #[tokio::test]
    async fn test_exhausted_audio_job_marks_meeting_failed() {
        let (state, _dir) = make_state(Arc::new(FailingProvider));

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        state.db.create_meeting(&meeting).unwrap();

        let job = state.db.enqueue_job(QueueName::ProcessMeetingAudio, "m1").unwrap();
        let handler: Arc<dyn JobHandler> = AudioJobHandler::new(state.clone());

        // Burn through every attempt with a synthetic clock
        let mut now = job.run_at_ms;
        for _ in 0..10 {
            run_pending_job_once_at(&state.db, QueueName::ProcessMeetingAudio, &handler, now)
                .await
                .unwrap();
            now += 60_000;
        }

        let stored = state.db.get_job(&job.id).unwrap().unwrap();
        assert_eq!(stored.attempts, 3);
        assert_eq!(state.db.get_meeting("m1").unwrap().unwrap().status, MeetingStatus::Failed);
    }

    #[tokio::test]
    async fn test_notes_job_regenerates_independently() {
        let (state, _dir) = make_state(Arc::new(MockTranscriptionProvider));

        let meeting = Meeting::new("m1".to_string(), "Sync".to_string(), "uploads/a.m4a".to_string());
        state.db.create_meeting(&meeting).unwrap();

        // Seed the transcript through the audio pipeline first
        process_meeting_audio(&state.db, &state.transcription, "m1").await.unwrap();

        let job = state.db.enqueue_job(QueueName::GenerateMeetingNotes, "m1").unwrap();
        let handler: Arc<dyn JobHandler> = NotesJobHandler::new(state.clone());

        let ran = run_pending_job_once_at(&state.db, QueueName::GenerateMeetingNotes, &handler, job.run_at_ms)
            .await
            .unwrap();
        assert!(ran);
        assert!(state.db.get_meeting_notes("m1").unwrap().is_some());
    }
}
