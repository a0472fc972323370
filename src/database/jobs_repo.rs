// Jobs repository for the meeting-notes worker
// Durable queue rows: enqueue, lease, ack, retry with backoff, dead-parking

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::models::{Job, JobStatus, QueueName};
use super::DatabaseManager;

/// Attempt cap matching the producing side's enqueue options
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between attempts
pub const BACKOFF_BASE_DELAY_MS: i64 = 2000;

/// Backoff before retry N+1 after N failed attempts: base * 2^(N-1)
pub fn backoff_delay_ms(attempts: u32) -> i64 {
    BACKOFF_BASE_DELAY_MS * (1_i64 << attempts.saturating_sub(1).min(16))
}

impl DatabaseManager {
    /// Enqueue a job; the producing API tier calls this on upload completion
    pub fn enqueue_job(&self, queue: QueueName, meeting_id: &str) -> Result<Job> {
        self.with_connection(|conn| {
            enqueue_job_impl(conn, queue, meeting_id)
        })
    }

    /// Lease the oldest due job on a queue, marking it running
    ///
    /// Leasing counts as an attempt. Returns None when nothing is due.
    pub fn lease_next_job(&self, queue: QueueName, now_ms: i64) -> Result<Option<Job>> {
        self.with_connection(|conn| {
            lease_next_job_impl(conn, queue, now_ms)
        })
    }

    /// Acknowledge a completed job by removing it
    pub fn ack_job(&self, job_id: &str) -> Result<()> {
        self.with_connection(|conn| {
            ack_job_impl(conn, job_id)
        })
    }

    /// Record a failed attempt: re-queue with backoff, or park as dead at the cap
    ///
    /// Returns the status the job ended up in.
    pub fn fail_job(&self, job: &Job, error: &str, now_ms: i64) -> Result<JobStatus> {
        self.with_connection(|conn| {
            fail_job_impl(conn, job, error, now_ms)
        })
    }

    /// Get a job by ID
    pub fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        self.with_connection(|conn| {
            get_job_impl(conn, job_id)
        })
    }

    /// Re-queue jobs left running by a previous process (crash recovery)
    pub fn requeue_stale_running_jobs(&self) -> Result<usize> {
        self.with_connection(|conn| {
            requeue_stale_running_jobs_impl(conn)
        })
    }
}

fn enqueue_job_impl(conn: &Connection, queue: QueueName, meeting_id: &str) -> Result<Job> {
    let job = Job {
        id: uuid::Uuid::new_v4().to_string(),
        queue,
        meeting_id: meeting_id.to_string(),
        status: JobStatus::Queued,
        attempts: 0,
        max_attempts: DEFAULT_MAX_ATTEMPTS,
        run_at_ms: chrono::Utc::now().timestamp_millis(),
        last_error: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    conn.execute(
        r#"
        INSERT INTO jobs (id, queue, meeting_id, status, attempts, max_attempts, run_at_ms, last_error, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            job.id,
            job.queue.as_str(),
            job.meeting_id,
            job.status.as_str(),
            job.attempts,
            job.max_attempts,
            job.run_at_ms,
            job.last_error,
            job.created_at,
        ],
    ).context("Failed to enqueue job")?;

    Ok(job)
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let queue_raw: String = row.get(1)?;
    let queue = queue_raw.parse::<QueueName>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;
    let status_raw: String = row.get(3)?;
    let status = status_raw.parse::<JobStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Job {
        id: row.get(0)?,
        queue,
        meeting_id: row.get(2)?,
        status,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        run_at_ms: row.get(6)?,
        last_error: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn lease_next_job_impl(conn: &Connection, queue: QueueName, now_ms: i64) -> Result<Option<Job>> {
    // The connection mutex serializes consumers, so select-then-update is race-free
    let mut stmt = conn.prepare(
        r#"
        SELECT id, queue, meeting_id, status, attempts, max_attempts, run_at_ms, last_error, created_at
        FROM jobs
        WHERE queue = ?1 AND status = 'queued' AND run_at_ms <= ?2
        ORDER BY run_at_ms ASC, created_at ASC
        LIMIT 1
        "#
    ).context("Failed to prepare lease query")?;

    let result = stmt.query_row(params![queue.as_str(), now_ms], row_to_job);

    let mut job = match result {
        Ok(job) => job,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e).context("Failed to query next job"),
    };

    job.status = JobStatus::Running;
    job.attempts += 1;

    conn.execute(
        "UPDATE jobs SET status = 'running', attempts = ?1 WHERE id = ?2",
        params![job.attempts, job.id],
    ).context("Failed to lease job")?;

    Ok(Some(job))
}

fn ack_job_impl(conn: &Connection, job_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM jobs WHERE id = ?",
        params![job_id],
    ).context("Failed to ack job")?;

    Ok(())
}

fn fail_job_impl(conn: &Connection, job: &Job, error: &str, now_ms: i64) -> Result<JobStatus> {
    let status = if job.attempts >= job.max_attempts {
        JobStatus::Dead
    } else {
        JobStatus::Queued
    };

    let run_at_ms = match status {
        JobStatus::Queued => now_ms + backoff_delay_ms(job.attempts),
        _ => job.run_at_ms,
    };

    conn.execute(
        "UPDATE jobs SET status = ?1, run_at_ms = ?2, last_error = ?3 WHERE id = ?4",
        params![status.as_str(), run_at_ms, error, job.id],
    ).context("Failed to record job failure")?;

    Ok(status)
}

fn get_job_impl(conn: &Connection, job_id: &str) -> Result<Option<Job>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, queue, meeting_id, status, attempts, max_attempts, run_at_ms, last_error, created_at
        FROM jobs WHERE id = ?
        "#
    ).context("Failed to prepare get_job query")?;

    let result = stmt.query_row(params![job_id], row_to_job);

    match result {
        Ok(job) => Ok(Some(job)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context("Failed to get job"),
    }
}

fn requeue_stale_running_jobs_impl(conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE jobs SET status = 'queued' WHERE status = 'running'",
        [],
    ).context("Failed to requeue stale running jobs")?;

    Ok(updated)
}
