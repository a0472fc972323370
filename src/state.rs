// Shared state for the meeting-notes worker

use std::sync::Arc;

use crate::config::Config;
use crate::database::DatabaseManager;
use crate::notes::NotesGenerator;
use crate::storage::AudioObjectStore;
use crate::transcription::TranscriptionProvider;

/// Everything a job handler or background task needs, built once at startup
pub struct WorkerState {
    /// Database manager for SQLite persistence
    pub db: Arc<DatabaseManager>,
    /// Object storage seam (signed URLs, deletes)
    pub store: Arc<dyn AudioObjectStore>,
    /// The active transcription backend
    pub transcription: Arc<dyn TranscriptionProvider>,
    /// Notes generator with configured backend and heuristic fallback
    pub notes: Arc<NotesGenerator>,
    /// Validated configuration
    pub config: Arc<Config>,
}

impl WorkerState {
    pub fn new(
        db: Arc<DatabaseManager>,
        store: Arc<dyn AudioObjectStore>,
        transcription: Arc<dyn TranscriptionProvider>,
        notes: Arc<NotesGenerator>,
        config: Arc<Config>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            store,
            transcription,
            notes,
            config,
        })
    }
}
