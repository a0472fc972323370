// Database models - Durable queue jobs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two named queues the worker consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    ProcessMeetingAudio,
    GenerateMeetingNotes,
}

impl QueueName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::ProcessMeetingAudio => "process_meeting_audio",
            QueueName::GenerateMeetingNotes => "generate_meeting_notes",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process_meeting_audio" => Ok(QueueName::ProcessMeetingAudio),
            "generate_meeting_notes" => Ok(QueueName::GenerateMeetingNotes),
            other => Err(format!("Unknown queue: {}", other)),
        }
    }
}

/// Queue job lifecycle
///
/// enqueued (queued) -> leased (running) -> removed on success, or re-queued
/// with backoff until the attempt cap, then parked as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Dead,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Dead => "dead",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "dead" => Ok(JobStatus::Dead),
            other => Err(format!("Unknown job status: {}", other)),
        }
    }
}

/// One durable queue job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub queue: QueueName,
    pub meeting_id: String,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Earliest epoch-millisecond instant the job may be leased
    pub run_at_ms: i64,
    pub last_error: Option<String>,
    pub created_at: String,
}
