// Database models - Re-exports all domain-specific models
//
// This module is split into focused files by domain:
// - meeting.rs: Meeting rows and status lifecycle
// - transcript.rs: Speakers and transcript segments
// - notes.rs: Meeting notes and action items
// - job.rs: Durable queue jobs

mod job;
mod meeting;
mod notes;
mod transcript;

pub use job::{Job, JobStatus, QueueName};
pub use meeting::{tombstone_audio_url, Meeting, MeetingStatus, DELETED_AUDIO_PREFIX};
pub use notes::{ActionItem, ActionItemStatus, MeetingNotes};
pub use transcript::{Speaker, TranscriptSegment};
