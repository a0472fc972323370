// Database models - Meeting
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix marking an audio object that the retention sweep has deleted
pub const DELETED_AUDIO_PREFIX: &str = "deleted://";

/// Rewrite an audio object key into its tombstoned form
pub fn tombstone_audio_url(audio_url: &str) -> String {
    format!("{}{}", DELETED_AUDIO_PREFIX, audio_url)
}

/// Meeting processing lifecycle
///
/// Only advances uploaded -> processing -> {completed | failed}. Reprocessing
/// may re-enter processing, but segments are never duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Uploaded => "uploaded",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(MeetingStatus::Uploaded),
            "processing" => Ok(MeetingStatus::Processing),
            "completed" => Ok(MeetingStatus::Completed),
            "failed" => Ok(MeetingStatus::Failed),
            other => Err(format!("Unknown meeting status: {}", other)),
        }
    }
}

/// A meeting owned by a single account; all derived records hang off it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub status: MeetingStatus,
    /// Object-storage key for the uploaded audio, or `deleted://<key>` once swept
    pub audio_url: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub duration_sec: Option<f64>,
}

impl Meeting {
    pub fn new(id: String, title: String, audio_url: String) -> Self {
        Self {
            id,
            title,
            status: MeetingStatus::Uploaded,
            audio_url,
            created_at: chrono::Utc::now().to_rfc3339(),
            started_at: None,
            duration_sec: None,
        }
    }

    /// Whether the retention sweep already removed the audio object
    pub fn audio_deleted(&self) -> bool {
        self.audio_url.starts_with(DELETED_AUDIO_PREFIX)
    }
}
