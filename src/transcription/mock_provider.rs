//! Mock transcription provider
//!
//! Returns a fixed three-segment fixture; used for local development and
//! tests. Never fails.

use async_trait::async_trait;

use super::provider::{ProviderSegment, TranscriptionError, TranscriptionProvider};

pub struct MockTranscriptionProvider;

#[async_trait]
impl TranscriptionProvider for MockTranscriptionProvider {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn transcribe_and_diarize(
        &self,
        _audio_object_key: &str,
    ) -> Result<Vec<ProviderSegment>, TranscriptionError> {
        Ok(vec![
            ProviderSegment {
                speaker_label: "Speaker 1".to_string(),
                start_ms: 0,
                end_ms: 6500,
                text: "Welcome everyone. Let's align on launch timelines.".to_string(),
                confidence: Some(0.91),
            },
            ProviderSegment {
                speaker_label: "Speaker 2".to_string(),
                start_ms: 6800,
                end_ms: 11500,
                text: "Engineering can deliver the API by next Friday.".to_string(),
                confidence: Some(0.88),
            },
            ProviderSegment {
                speaker_label: "Speaker 1".to_string(),
                start_ms: 11800,
                end_ms: 18000,
                text: "Great, let's capture action items and owners.".to_string(),
                confidence: Some(0.93),
            },
        ])
    }
}
