//! Process-wide job telemetry
//!
//! Success/failure counters and cumulative durations per job type.
//! Never persisted; a periodic task logs the snapshot.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// The two job types the worker consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    ProcessMeetingAudio,
    GenerateMeetingNotes,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::ProcessMeetingAudio => "process_meeting_audio",
            JobType::GenerateMeetingNotes => "generate_meeting_notes",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Metric {
    completed: u64,
    failed: u64,
    total_duration_ms: u64,
}

#[derive(Debug, Default)]
struct TelemetryState {
    process_meeting_audio: Metric,
    generate_meeting_notes: Metric,
}

impl TelemetryState {
    fn metric_mut(&mut self, job_type: JobType) -> &mut Metric {
        match job_type {
            JobType::ProcessMeetingAudio => &mut self.process_meeting_audio,
            JobType::GenerateMeetingNotes => &mut self.generate_meeting_notes,
        }
    }
}

static TELEMETRY: Lazy<Mutex<TelemetryState>> = Lazy::new(|| Mutex::new(TelemetryState::default()));

/// Record a successful job execution with its duration
pub fn record_job_success(job_type: JobType, duration_ms: u64) {
    if let Ok(mut state) = TELEMETRY.lock() {
        let metric = state.metric_mut(job_type);
        metric.completed += 1;
        metric.total_duration_ms += duration_ms;
    }
}

/// Record a failed job execution with its duration
pub fn record_job_failure(job_type: JobType, duration_ms: u64) {
    if let Ok(mut state) = TELEMETRY.lock() {
        let metric = state.metric_mut(job_type);
        metric.failed += 1;
        metric.total_duration_ms += duration_ms;
    }
}

/// Derived metrics for one job type
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobTypeSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub total_duration_ms: u64,
    pub attempts: u64,
    pub failure_rate: f64,
    pub avg_duration_ms: u64,
}

impl JobTypeSnapshot {
    fn from_metric(metric: Metric) -> Self {
        let attempts = metric.completed + metric.failed;
        let failure_rate = if attempts == 0 {
            0.0
        } else {
            metric.failed as f64 / attempts as f64
        };
        let avg_duration_ms = if attempts == 0 {
            0
        } else {
            ((metric.total_duration_ms as f64) / (attempts as f64)).round() as u64
        };
        Self {
            completed: metric.completed,
            failed: metric.failed,
            total_duration_ms: metric.total_duration_ms,
            attempts,
            failure_rate,
            avg_duration_ms,
        }
    }
}

/// Snapshot across all job types
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub process_meeting_audio: JobTypeSnapshot,
    pub generate_meeting_notes: JobTypeSnapshot,
}

/// Take a point-in-time snapshot of all counters
pub fn telemetry_snapshot() -> TelemetrySnapshot {
    let state = TELEMETRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    TelemetrySnapshot {
        process_meeting_audio: JobTypeSnapshot::from_metric(state.process_meeting_audio),
        generate_meeting_notes: JobTypeSnapshot::from_metric(state.generate_meeting_notes),
    }
}

/// Spawn the periodic telemetry log emission
pub fn start_telemetry_task(interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        // First tick fires immediately; skip it so the first line is a full interval in
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = telemetry_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => log::info!("Worker telemetry {}", json),
                Err(e) => log::warn!("Failed to serialize telemetry snapshot: {}", e),
            }
        }
    })
}

/// Serializes tests that observe the process-global counters
#[cfg(test)]
pub static TELEMETRY_TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[cfg(test)]
pub fn reset_for_tests() {
    let mut state = TELEMETRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *state = TelemetryState::default();
}
