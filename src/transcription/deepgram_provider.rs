//! Managed transcription provider (Deepgram)
//!
//! Resolves a signed download URL for the audio object, then calls the
//! Deepgram listen API with diarization, punctuation, and smart formatting
//! enabled. Utterances map to provider segments: speaker indices become
//! 1-based "Speaker N" labels, fractional seconds become rounded
//! milliseconds.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::provider::{ProviderSegment, TranscriptionError, TranscriptionProvider};
use crate::config::DeepgramConfig;
use crate::storage::AudioObjectStore;

#[derive(Debug, Serialize)]
struct DeepgramRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeepgramResponse {
    #[serde(default)]
    results: Option<DeepgramResults>,
}

#[derive(Debug, Deserialize)]
struct DeepgramResults {
    #[serde(default)]
    utterances: Vec<DeepgramUtterance>,
}

#[derive(Debug, Deserialize)]
pub struct DeepgramUtterance {
    pub start: f64,
    pub end: f64,
    pub transcript: String,
    pub speaker: u32,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Map Deepgram utterances to normalized provider segments
pub fn map_utterances(utterances: Vec<DeepgramUtterance>) -> Vec<ProviderSegment> {
    utterances
        .into_iter()
        .map(|utterance| ProviderSegment {
            speaker_label: format!("Speaker {}", utterance.speaker + 1),
            start_ms: (utterance.start * 1000.0).round() as i64,
            end_ms: (utterance.end * 1000.0).round() as i64,
            text: utterance.transcript,
            confidence: utterance.confidence,
        })
        .collect()
}

pub struct DeepgramTranscriptionProvider {
    config: DeepgramConfig,
    store: Arc<dyn AudioObjectStore>,
    client: Client,
}

impl DeepgramTranscriptionProvider {
    pub fn new(config: DeepgramConfig, store: Arc<dyn AudioObjectStore>) -> Self {
        Self {
            config,
            store,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for DeepgramTranscriptionProvider {
    fn provider_name(&self) -> &'static str {
        "managed"
    }

    async fn transcribe_and_diarize(
        &self,
        audio_object_key: &str,
    ) -> Result<Vec<ProviderSegment>, TranscriptionError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            TranscriptionError::MissingConfiguration(
                "Set DEEPGRAM_API_KEY for the managed transcription provider".to_string(),
            )
        })?;

        let audio_url = self.store.presign_download(audio_object_key).await?;

        let mut query: Vec<(&str, &str)> = vec![
            ("model", self.config.model.as_str()),
            ("diarize", "true"),
            ("punctuate", "true"),
            ("smart_format", "true"),
            ("utterances", "true"),
        ];
        if let Some(language) = self.config.language.as_deref() {
            query.push(("language", language));
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&query)
            .header("authorization", format!("Token {}", api_key))
            .json(&DeepgramRequest { url: &audio_url })
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(format!("deepgram: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::RequestFailed(format!(
                "deepgram: {} {}", status, body
            )));
        }

        let payload: DeepgramResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(format!("deepgram: {}", e)))?;

        let utterances = payload.results.map(|r| r.utterances).unwrap_or_default();
        Ok(map_utterances(utterances))
    }
}
