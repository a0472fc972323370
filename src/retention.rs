//! Audio retention sweeper
//!
//! Periodically deletes aged audio objects for meetings that reached a
//! terminal status, then tombstones their reference so the next sweep
//! skips them. Per-item failures never abort the batch.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetentionConfig;
use crate::database::{tombstone_audio_url, DatabaseManager};
use crate::storage::AudioObjectStore;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub candidates: usize,
    pub deleted: usize,
}

/// Run one retention sweep
///
/// Selects up to `batch_size` meetings older than the retention window with
/// terminal status and live audio, oldest first. Each candidate's audio
/// object is deleted and its reference rewritten to `deleted://<key>`;
/// tombstoned rows fall out of future candidate sets, which makes the sweep
/// naturally idempotent.
pub async fn run_audio_retention_sweep(
    db: &DatabaseManager,
    store: &Arc<dyn AudioObjectStore>,
    config: &RetentionConfig,
) -> Result<SweepStats> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(config.days as i64);
    let candidates = db.list_retention_candidates(&cutoff.to_rfc3339(), config.batch_size)?;

    if candidates.is_empty() {
        return Ok(SweepStats { candidates: 0, deleted: 0 });
    }

    let mut deleted = 0;

    for meeting in &candidates {
        // The query excludes these, but re-check in case a row changed
        // between the select and this iteration
        if meeting.audio_url.is_empty() || meeting.audio_deleted() {
            continue;
        }

        match store.delete_object(&meeting.audio_url).await {
            Ok(()) => {
                db.update_meeting_audio_url(&meeting.id, &tombstone_audio_url(&meeting.audio_url))?;
                deleted += 1;
            }
            Err(e) => {
                // Isolated: the rest of the batch still runs, and this row
                // stays a candidate for the next sweep
                log::error!("Audio retention delete failed for meeting {}: {}", meeting.id, e);
            }
        }
    }

    let stats = SweepStats {
        candidates: candidates.len(),
        deleted,
    };
    log::info!(
        "Audio retention sweep completed: {} candidates, {} deleted, retention {} days",
        stats.candidates, stats.deleted, config.days
    );
    Ok(stats)
}

/// Spawn the periodic sweep when retention is enabled
pub fn start_retention_task(
    db: Arc<DatabaseManager>,
    store: Arc<dyn AudioObjectStore>,
    config: RetentionConfig,
) -> Option<tokio::task::JoinHandle<()>> {
    if !config.enabled {
        log::info!("Audio retention disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_minutes * 60));
        loop {
            ticker.tick().await;
            if let Err(e) = run_audio_retention_sweep(&db, &store, &config).await {
                log::error!("Audio retention sweep failed: {:#}", e);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Meeting, MeetingStatus};
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct RecordingStore {
        deleted: Mutex<Vec<String>>,
        fail_keys: HashSet<String>,
    }

    impl RecordingStore {
        fn new(fail_keys: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                deleted: Mutex::new(Vec::new()),
                fail_keys: fail_keys.iter().map(|k| k.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl AudioObjectStore for RecordingStore {
        async fn presign_download(&self, object_key: &str) -> Result<String, StorageError> {
            Ok(format!("https://storage.example/{}", object_key))
        }

        async fn delete_object(&self, object_key: &str) -> Result<(), StorageError> {
            if self.fail_keys.contains(object_key) {
                return Err(StorageError::RequestFailed(format!("cannot delete {}", object_key)));
            }
            self.deleted.lock().unwrap().push(object_key.to_string());
            Ok(())
        }
    }

    fn create_test_db() -> DatabaseManager {
        let dir = tempdir().unwrap();
        let db_path = dir.into_path().join("test.db");
        DatabaseManager::new(db_path).unwrap()
    }

    fn retention_config() -> RetentionConfig {
        RetentionConfig {
            enabled: true,
            days: 30,
            sweep_minutes: 60,
            batch_size: 100,
        }
    }

    fn seed_old_meeting(db: &DatabaseManager, id: &str, audio_url: &str, status: MeetingStatus) {
        let mut meeting = Meeting::new(id.to_string(), id.to_string(), audio_url.to_string());
        meeting.created_at = "2020-01-01T00:00:00+00:00".to_string();
        meeting.status = status;
        db.create_meeting(&meeting).unwrap();
    }

    #[tokio::test]
    async fn test_sweep_tombstones_and_excludes_next_time() {
        let db = create_test_db();
        let store = RecordingStore::new(&[]);
        let dyn_store: Arc<dyn AudioObjectStore> = store.clone();

        seed_old_meeting(&db, "m1", "uploads/x", MeetingStatus::Completed);

        let stats = run_audio_retention_sweep(&db, &dyn_store, &retention_config()).await.unwrap();
        assert_eq!(stats, SweepStats { candidates: 1, deleted: 1 });

        let meeting = db.get_meeting("m1").unwrap().unwrap();
        assert_eq!(meeting.audio_url, "deleted://uploads/x");
        assert_eq!(store.deleted.lock().unwrap().as_slice(), ["uploads/x"]);

        // Tombstoned row is no longer a candidate
        let stats = run_audio_retention_sweep(&db, &dyn_store, &retention_config()).await.unwrap();
        assert_eq!(stats, SweepStats { candidates: 0, deleted: 0 });
        assert_eq!(store.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_is_isolated() {
        let db = create_test_db();
        let store = RecordingStore::new(&["uploads/bad"]);
        let dyn_store: Arc<dyn AudioObjectStore> = store.clone();

        seed_old_meeting(&db, "bad", "uploads/bad", MeetingStatus::Failed);
        seed_old_meeting(&db, "good", "uploads/good", MeetingStatus::Completed);

        let stats = run_audio_retention_sweep(&db, &dyn_store, &retention_config()).await.unwrap();
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.deleted, 1);

        // The failing row keeps its live reference and stays a candidate
        assert_eq!(db.get_meeting("bad").unwrap().unwrap().audio_url, "uploads/bad");
        assert_eq!(db.get_meeting("good").unwrap().unwrap().audio_url, "deleted://uploads/good");

        let stats = run_audio_retention_sweep(&db, &dyn_store, &retention_config()).await.unwrap();
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.deleted, 0);
    }

    #[tokio::test]
    async fn test_batch_size_caps_one_sweep() {
        let db = create_test_db();
        let store = RecordingStore::new(&[]);
        let dyn_store: Arc<dyn AudioObjectStore> = store.clone();

        for i in 0..3 {
            seed_old_meeting(&db, &format!("m{}", i), &format!("uploads/{}", i), MeetingStatus::Completed);
        }

        let mut config = retention_config();
        config.batch_size = 2;

        let stats = run_audio_retention_sweep(&db, &dyn_store, &config).await.unwrap();
        assert_eq!(stats, SweepStats { candidates: 2, deleted: 2 });

        // The remainder lands in the next sweep
        let stats = run_audio_retention_sweep(&db, &dyn_store, &config).await.unwrap();
        assert_eq!(stats, SweepStats { candidates: 1, deleted: 1 });
    }
}
