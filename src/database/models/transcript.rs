// Database models - Speakers and transcript segments
use serde::{Deserialize, Serialize};

/// A diarized speaker within one meeting
///
/// Created lazily the first time a provider label is seen while ingesting
/// segments; at most one row per (meeting, label).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub meeting_id: String,
    /// Provider-assigned label, e.g. "Speaker 1"
    pub label: String,
    /// Human-assigned name; defaults to the label on creation
    pub display_name: Option<String>,
}

/// One time-aligned piece of the transcript
///
/// Immutable once written by the audio pipeline; ordered by start_ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    pub meeting_id: String,
    pub speaker_id: Option<String>,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub confidence: Option<f64>,
}
