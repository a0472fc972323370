//! Heuristic notes generator
//!
//! Zero-dependency summarizer used directly, and as the fallback whenever
//! the LLM-backed path fails.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ActionItemDraft, NoteSegment, NotesOutput};

/// Summary body length cap, in characters
const SUMMARY_MAX_CHARS: usize = 700;

/// Cap on extracted key points and action items
const MAX_KEY_POINTS: usize = 5;
const MAX_ACTION_ITEMS: usize = 5;

/// Lexical cues that mark a segment as an action item
static ACTION_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(will|todo|action|next|by)\b").expect("valid action cue regex"));

/// Generate summary, key points, and action items from transcript segments
pub fn generate_summary(segments: &[NoteSegment]) -> NotesOutput {
    let joined = segments
        .iter()
        .map(|s| format!("{}: {}", s.speaker, s.text))
        .collect::<Vec<_>>()
        .join(" ");

    let summary_md = if joined.is_empty() {
        "## Summary\nNo transcript available.".to_string()
    } else {
        let char_count = joined.chars().count();
        let body: String = joined.chars().take(SUMMARY_MAX_CHARS).collect();
        let ellipsis = if char_count > SUMMARY_MAX_CHARS { "..." } else { "" };
        format!("## Summary\n{}{}", body, ellipsis)
    };

    let key_points = segments
        .iter()
        .take(MAX_KEY_POINTS)
        .map(|s| s.text.clone())
        .collect();

    let action_items = segments
        .iter()
        .filter(|s| ACTION_CUE.is_match(&s.text))
        .take(MAX_ACTION_ITEMS)
        .map(|s| ActionItemDraft {
            task: s.text.clone(),
            owner_name: Some(s.speaker.clone()),
            source_segment_id: Some(s.id.clone()),
        })
        .collect();

    NotesOutput {
        summary_md,
        key_points,
        action_items,
    }
}
