//! Transcription provider trait and types
//!
//! Defines the common interface for all transcription backends (mock,
//! managed, local). Each backend turns an audio object reference into an
//! ordered sequence of diarized segments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::StorageError;

/// Error types for transcription operations
#[derive(Debug, Clone)]
pub enum TranscriptionError {
    /// Required credential or endpoint missing for the selected backend
    MissingConfiguration(String),
    /// Could not resolve a signed download URL for the audio object
    StorageFailed(String),
    /// Request failed (network, non-success status)
    RequestFailed(String),
    /// Request exceeded its configured time budget
    Timeout(String),
    /// Backend returned a payload we could not parse
    InvalidResponse(String),
}

impl fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionError::MissingConfiguration(msg) => write!(f, "Transcription not configured: {}", msg),
            TranscriptionError::StorageFailed(msg) => write!(f, "Audio URL resolution failed: {}", msg),
            TranscriptionError::RequestFailed(msg) => write!(f, "Transcription request failed: {}", msg),
            TranscriptionError::Timeout(msg) => write!(f, "Transcription timed out: {}", msg),
            TranscriptionError::InvalidResponse(msg) => write!(f, "Invalid transcription response: {}", msg),
        }
    }
}

impl std::error::Error for TranscriptionError {}

impl From<StorageError> for TranscriptionError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::MissingConfiguration(msg) => TranscriptionError::MissingConfiguration(msg),
            other => TranscriptionError::StorageFailed(other.to_string()),
        }
    }
}

/// Normalized backend output: one diarized utterance
///
/// Mapped 1:1 into persisted transcript segments, with speaker labels
/// de-duplicated into speaker rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSegment {
    /// Stable per-meeting label, e.g. "Speaker 1"
    pub speaker_label: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    pub confidence: Option<f64>,
}

/// The single capability all transcription backends implement
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Backend name for logs
    fn provider_name(&self) -> &'static str;

    /// Transcribe and diarize the referenced audio object
    ///
    /// Segments come back in utterance order with non-decreasing start times.
    async fn transcribe_and_diarize(
        &self,
        audio_object_key: &str,
    ) -> Result<Vec<ProviderSegment>, TranscriptionError>;
}
