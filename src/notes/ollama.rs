//! Ollama-backed notes generator
//!
//! Formats the transcript into a strict-JSON prompt and calls a local
//! Ollama generate endpoint, non-streaming, with a bounded timeout. Any
//! failure here is recoverable: the caller falls back to the heuristic.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{ActionItemDraft, NoteSegment, NotesOutput};
use crate::config::NotesConfig;

/// Cap on transcript segments included in the prompt
const MAX_PROMPT_SEGMENTS: usize = 400;

/// Error types for the LLM notes path; never escapes the notes module
#[derive(Debug, Clone)]
pub enum NotesError {
    /// Request failed (network, non-success status)
    RequestFailed(String),
    /// Request exceeded its configured time budget
    Timeout(String),
    /// Response was not the strict JSON we asked for
    InvalidResponse(String),
}

impl fmt::Display for NotesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotesError::RequestFailed(msg) => write!(f, "Notes request failed: {}", msg),
            NotesError::Timeout(msg) => write!(f, "Notes request timed out: {}", msg),
            NotesError::InvalidResponse(msg) => write!(f, "Invalid notes response: {}", msg),
        }
    }
}

impl std::error::Error for NotesError {}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaNotesResult {
    #[serde(rename = "summaryMd")]
    summary_md: String,
    #[serde(rename = "keyPoints", default)]
    key_points: Vec<String>,
    #[serde(rename = "actionItems", default)]
    action_items: Vec<OllamaActionItem>,
}

#[derive(Debug, Deserialize)]
struct OllamaActionItem {
    task: String,
    #[serde(rename = "ownerName", default)]
    owner_name: Option<String>,
}

/// Format the transcript as numbered "[n] speaker: text" lines
fn format_transcript_for_prompt(segments: &[NoteSegment]) -> String {
    segments
        .iter()
        .take(MAX_PROMPT_SEGMENTS)
        .enumerate()
        .map(|(index, segment)| format!("[{}] {}: {}", index + 1, segment.speaker, segment.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(segments: &[NoteSegment]) -> String {
    [
        "You are an assistant generating concise meeting notes.",
        "Return strict JSON only with keys: summaryMd, keyPoints, actionItems.",
        "actionItems must be an array of objects with keys: task, ownerName.",
        "Do not include markdown code fences.",
        "Transcript:",
        &format_transcript_for_prompt(segments),
    ]
    .join("\n\n")
}

/// Parse and validate the model's strict-JSON answer
fn parse_notes_result(raw: &str) -> Result<NotesOutput, NotesError> {
    let parsed: OllamaNotesResult = serde_json::from_str(raw)
        .map_err(|e| NotesError::InvalidResponse(format!("not valid JSON: {}", e)))?;

    if parsed.summary_md.trim().is_empty() {
        return Err(NotesError::InvalidResponse("summaryMd is empty".to_string()));
    }

    let mut action_items = Vec::with_capacity(parsed.action_items.len());
    for item in parsed.action_items {
        if item.task.trim().is_empty() {
            return Err(NotesError::InvalidResponse("action item task is empty".to_string()));
        }
        action_items.push(ActionItemDraft {
            task: item.task,
            owner_name: Some(item.owner_name.unwrap_or_else(|| "Unassigned".to_string())),
            // The model does not cite segments; only the heuristic path does
            source_segment_id: None,
        });
    }

    Ok(NotesOutput {
        summary_md: parsed.summary_md,
        key_points: parsed.key_points,
        action_items,
    })
}

/// Client for the Ollama generate endpoint
pub struct OllamaNotesGenerator {
    config: NotesConfig,
    client: Client,
}

impl OllamaNotesGenerator {
    pub fn new(config: NotesConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Generate notes via the LLM; errors are for the caller's fallback
    pub async fn generate(&self, segments: &[NoteSegment]) -> Result<NotesOutput, NotesError> {
        let prompt = build_prompt(segments);

        let response = self
            .client
            .post(&self.config.ollama_endpoint)
            .timeout(Duration::from_millis(self.config.ollama_timeout_ms))
            .json(&OllamaGenerateRequest {
                model: &self.config.ollama_model,
                prompt: &prompt,
                stream: false,
                format: "json",
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotesError::Timeout(format!("ollama: {}", e))
                } else {
                    NotesError::RequestFailed(format!("ollama: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotesError::RequestFailed(format!("ollama: {} {}", status, body)));
        }

        let payload: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| NotesError::InvalidResponse(format!("ollama: {}", e)))?;

        parse_notes_result(payload.response.as_deref().unwrap_or("{}"))
    }
}
