// Queue consumer loop
// Leases one job at a time per consumer, dispatches to its handler, and
// applies the retry/backoff/park discipline around every execution

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::database::{DatabaseManager, JobStatus, QueueName};
use crate::telemetry::{record_job_failure, record_job_success, JobType};

/// Work executed for one leased job
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Process the job; an error sends it back through the retry path
    async fn execute(&self, meeting_id: &str) -> Result<()>;

    /// Called once when the job parks dead after exhausting its attempts
    async fn on_exhausted(&self, _meeting_id: &str) {}
}

fn job_type_for(queue: QueueName) -> JobType {
    match queue {
        QueueName::ProcessMeetingAudio => JobType::ProcessMeetingAudio,
        QueueName::GenerateMeetingNotes => JobType::GenerateMeetingNotes,
    }
}

/// Lease and execute at most one due job; returns whether one was run
///
/// The handler runs in a spawned task, so a panic inside it is contained
/// and treated as a normal job failure. Telemetry is recorded for every
/// execution regardless of outcome.
pub async fn run_pending_job_once(
    db: &Arc<DatabaseManager>,
    queue: QueueName,
    handler: &Arc<dyn JobHandler>,
) -> Result<bool> {
    run_pending_job_once_at(db, queue, handler, chrono::Utc::now().timestamp_millis()).await
}

/// Same as [`run_pending_job_once`] with an explicit lease instant
pub async fn run_pending_job_once_at(
    db: &Arc<DatabaseManager>,
    queue: QueueName,
    handler: &Arc<dyn JobHandler>,
    now_ms: i64,
) -> Result<bool> {
    let Some(job) = db.lease_next_job(queue, now_ms)? else {
        return Ok(false);
    };

    let job_type = job_type_for(queue);
    let started = Instant::now();

    let task_handler = handler.clone();
    let task_meeting_id = job.meeting_id.clone();
    let joined = tokio::spawn(async move { task_handler.execute(&task_meeting_id).await }).await;

    let duration_ms = started.elapsed().as_millis() as u64;
    let outcome = match joined {
        Ok(result) => result,
        Err(join_error) => Err(anyhow!("Job task panicked: {}", join_error)),
    };

    match outcome {
        Ok(()) => {
            db.ack_job(&job.id)?;
            record_job_success(job_type, duration_ms);
            log::info!(
                "{} job {} completed for meeting {} in {}ms",
                queue, job.id, job.meeting_id, duration_ms
            );
        }
        Err(e) => {
            record_job_failure(job_type, duration_ms);
            log::error!(
                "{} job {} failed for meeting {} (attempt {}/{}): {:#}",
                queue, job.id, job.meeting_id, job.attempts, job.max_attempts, e
            );

            let status = db.fail_job(&job, &format!("{:#}", e), now_ms)?;
            if status == JobStatus::Dead {
                log::error!(
                    "{} job {} exhausted {} attempts, parking as dead",
                    queue, job.id, job.max_attempts
                );
                handler.on_exhausted(&job.meeting_id).await;
            }
        }
    }

    Ok(true)
}

/// One consumer loop over a named queue
pub struct QueueConsumer {
    db: Arc<DatabaseManager>,
    queue: QueueName,
    handler: Arc<dyn JobHandler>,
    poll_interval: Duration,
}

impl QueueConsumer {
    pub fn new(
        db: Arc<DatabaseManager>,
        queue: QueueName,
        handler: Arc<dyn JobHandler>,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            db,
            queue,
            handler,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Run the consumer loop until the process exits
    ///
    /// Jobs run serially within this consumer; queues proceed concurrently
    /// because each has its own consumer task. Database errors are logged
    /// and the loop keeps polling.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            log::info!("Consumer for {} online", self.queue);
            loop {
                match run_pending_job_once(&self.db, self.queue, &self.handler).await {
                    Ok(true) => {
                        // Drain eagerly while work is due
                        continue;
                    }
                    Ok(false) => {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                    Err(e) => {
                        log::error!("Consumer for {} hit a queue error: {:#}", self.queue, e);
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        })
    }
}
