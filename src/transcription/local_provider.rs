//! Local transcription provider
//!
//! Posts the signed audio URL to a self-hosted ASR endpoint. The request is
//! aborted after the configured timeout; the endpoint is expected to return
//! segments already shaped like provider output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::provider::{ProviderSegment, TranscriptionError, TranscriptionProvider};
use crate::config::LocalAsrConfig;
use crate::storage::AudioObjectStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalAsrRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct LocalAsrResponse {
    #[serde(default)]
    segments: Vec<LocalAsrSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalAsrSegment {
    speaker_label: String,
    start_ms: i64,
    end_ms: i64,
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct LocalTranscriptionProvider {
    config: LocalAsrConfig,
    store: Arc<dyn AudioObjectStore>,
    client: Client,
}

impl LocalTranscriptionProvider {
    pub fn new(config: LocalAsrConfig, store: Arc<dyn AudioObjectStore>) -> Self {
        Self {
            config,
            store,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for LocalTranscriptionProvider {
    fn provider_name(&self) -> &'static str {
        "local"
    }

    async fn transcribe_and_diarize(
        &self,
        audio_object_key: &str,
    ) -> Result<Vec<ProviderSegment>, TranscriptionError> {
        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            TranscriptionError::MissingConfiguration(
                "Set LOCAL_ASR_ENDPOINT for the local transcription provider".to_string(),
            )
        })?;

        let audio_url = self.store.presign_download(audio_object_key).await?;

        let mut request = self
            .client
            .post(endpoint)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(&LocalAsrRequest { audio_url: &audio_url });
        if let Some(api_key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TranscriptionError::Timeout(format!("local ASR: {}", e))
            } else {
                TranscriptionError::RequestFailed(format!("local ASR: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::RequestFailed(format!(
                "local ASR: {} {}", status, body
            )));
        }

        let payload: LocalAsrResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(format!("local ASR: {}", e)))?;

        Ok(payload
            .segments
            .into_iter()
            .map(|segment| ProviderSegment {
                speaker_label: segment.speaker_label,
                start_ms: segment.start_ms,
                end_ms: segment.end_ms,
                text: segment.text,
                confidence: segment.confidence,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    struct FixedUrlStore;

    #[async_trait]
    impl AudioObjectStore for FixedUrlStore {
        async fn presign_download(&self, object_key: &str) -> Result<String, StorageError> {
            Ok(format!("https://storage.example/{}", object_key))
        }

        async fn delete_object(&self, _object_key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_configuration_error() {
        let provider = LocalTranscriptionProvider::new(
            LocalAsrConfig {
                endpoint: None,
                api_key: None,
                timeout_ms: 1000,
            },
            Arc::new(FixedUrlStore),
        );

        let err = provider.transcribe_and_diarize("uploads/a.m4a").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::MissingConfiguration(_)));
    }

    #[test]
    fn test_response_parsing_defaults() {
        let payload: LocalAsrResponse = serde_json::from_str(
            r#"{"segments":[{"speakerLabel":"Speaker 1","startMs":0,"endMs":900,"text":"hi"}]}"#,
        ).unwrap();
        assert_eq!(payload.segments.len(), 1);
        assert_eq!(payload.segments[0].confidence, None);

        // Missing segments array parses as empty
        let empty: LocalAsrResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.segments.is_empty());
    }
}
