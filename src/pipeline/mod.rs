// Processing pipelines: audio -> transcript, transcript -> notes

pub mod process_audio;
pub mod process_notes;

pub use process_audio::process_meeting_audio;
pub use process_notes::process_meeting_notes;
