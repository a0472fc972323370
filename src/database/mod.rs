// Database module for the meeting-notes worker
// Provides SQLite persistence for meetings, speakers, transcripts, notes, and queue jobs

pub mod manager;
pub mod migrations;
pub mod models;
pub mod meetings_repo;
pub mod speakers_repo;
pub mod transcripts_repo;
pub mod notes_repo;
pub mod jobs_repo;

pub use manager::DatabaseManager;
pub use models::*;
pub use transcripts_repo::SegmentWithSpeaker;
