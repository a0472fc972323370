// Notes module: heuristic summarizer with optional LLM-backed generation
//
// Module structure:
// - heuristic.rs: Always-available summarizer (summary, key points, action items)
// - ollama.rs: Optional LLM path; any failure falls back to the heuristic

pub mod heuristic;
pub mod ollama;

use serde::{Deserialize, Serialize};

use crate::config::{NotesConfig, NotesProviderKind};

pub use heuristic::generate_summary;
pub use ollama::{NotesError, OllamaNotesGenerator};

/// Generator input: one transcript segment with its resolved speaker name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSegment {
    pub id: String,
    pub speaker: String,
    pub text: String,
}

/// An extracted action item before persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItemDraft {
    pub task: String,
    pub owner_name: Option<String>,
    pub source_segment_id: Option<String>,
}

/// Generated notes for one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesOutput {
    pub summary_md: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<ActionItemDraft>,
}

/// Notes generator with the configured backend and heuristic fallback
pub struct NotesGenerator {
    ollama: Option<OllamaNotesGenerator>,
}

impl NotesGenerator {
    /// Build the generator from validated configuration
    pub fn new(config: &NotesConfig) -> Self {
        let ollama = match config.provider {
            NotesProviderKind::Ollama => Some(OllamaNotesGenerator::new(config.clone())),
            NotesProviderKind::Heuristic => None,
        };
        Self { ollama }
    }

    /// Generate meeting notes
    ///
    /// The LLM path never fails the caller: on any error it logs and falls
    /// back to the heuristic, so this function is infallible.
    pub async fn generate(&self, segments: &[NoteSegment]) -> NotesOutput {
        let Some(ollama) = &self.ollama else {
            return generate_summary(segments);
        };

        match ollama.generate(segments).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Ollama notes generation failed, falling back to heuristic notes: {}", e);
                generate_summary(segments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, speaker: &str, text: &str) -> NoteSegment {
        NoteSegment {
            id: id.to_string(),
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    fn ollama_config(endpoint: &str) -> NotesConfig {
        NotesConfig {
            provider: NotesProviderKind::Ollama,
            ollama_endpoint: endpoint.to_string(),
            ollama_model: "llama3.1".to_string(),
            ollama_timeout_ms: 1000,
        }
    }

    #[tokio::test]
    async fn test_heuristic_backend_is_direct() {
        let generator = NotesGenerator::new(&NotesConfig {
            provider: NotesProviderKind::Heuristic,
            ollama_endpoint: "http://localhost:11434/api/generate".to_string(),
            ollama_model: "llama3.1".to_string(),
            ollama_timeout_ms: 1000,
        });

        let segments = vec![seg("s1", "Speaker 1", "We will ship Friday")];
        let output = generator.generate(&segments).await;
        assert_eq!(output, generate_summary(&segments));
    }

    #[tokio::test]
    async fn test_failing_llm_falls_back_to_heuristic() {
        // Nothing listens on this port; the request errors immediately
        let generator = NotesGenerator::new(&ollama_config("http://127.0.0.1:9/api/generate"));

        let segments = vec![
            seg("s1", "Speaker 1", "We will ship Friday"),
            seg("s2", "Speaker 2", "Nice weather today"),
        ];
        let output = generator.generate(&segments).await;

        // Structurally identical to the heuristic output for the same input
        assert_eq!(output, generate_summary(&segments));
        assert_eq!(output.action_items.len(), 1);
    }
}
