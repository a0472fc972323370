// Worker entry point
// Wires configuration, database, providers, consumers, and background tasks

use anyhow::{Context, Result};
use std::sync::Arc;

use meetnotes_worker::config::Config;
use meetnotes_worker::database::{DatabaseManager, QueueName};
use meetnotes_worker::notes::NotesGenerator;
use meetnotes_worker::queue::{AudioJobHandler, NotesJobHandler, QueueConsumer};
use meetnotes_worker::retention::start_retention_task;
use meetnotes_worker::state::WorkerState;
use meetnotes_worker::storage::{AudioObjectStore, StorageGatewayClient};
use meetnotes_worker::telemetry::start_telemetry_task;
use meetnotes_worker::transcription::create_transcription_provider;

/// Telemetry snapshot log cadence
const TELEMETRY_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenvy::dotenv();
    env_logger::init();

    let config = Arc::new(Config::from_env().context("Invalid worker configuration")?);

    let db = Arc::new(DatabaseManager::new(config.database_path.clone())?);

    // Jobs left running by a crashed process get one more chance
    let requeued = db.requeue_stale_running_jobs()?;
    if requeued > 0 {
        log::warn!("Re-queued {} jobs left running by a previous process", requeued);
    }

    let store: Arc<dyn AudioObjectStore> = Arc::new(StorageGatewayClient::new(config.storage.clone()));
    let transcription = create_transcription_provider(&config, store.clone());
    log::info!("Transcription provider: {}", transcription.provider_name());

    let notes = Arc::new(NotesGenerator::new(&config.notes));

    let state = WorkerState::new(db, store, transcription, notes, config);

    let audio_consumer = QueueConsumer::new(
        state.db.clone(),
        QueueName::ProcessMeetingAudio,
        AudioJobHandler::new(state.clone()),
        state.config.queue_poll_interval_ms,
    )
    .start();

    let notes_consumer = QueueConsumer::new(
        state.db.clone(),
        QueueName::GenerateMeetingNotes,
        NotesJobHandler::new(state.clone()),
        state.config.queue_poll_interval_ms,
    )
    .start();

    let retention_task = start_retention_task(
        state.db.clone(),
        state.store.clone(),
        state.config.retention.clone(),
    );
    let telemetry_task = start_telemetry_task(TELEMETRY_INTERVAL_SECS);

    log::info!("Worker online");

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    log::info!("Shutdown signal received, stopping worker");

    audio_consumer.abort();
    notes_consumer.abort();
    if let Some(task) = retention_task {
        task.abort();
    }
    telemetry_task.abort();

    Ok(())
}
