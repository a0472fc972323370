// Transcription module: provider abstraction and backends
//
// Module structure:
// - provider.rs: TranscriptionProvider trait, ProviderSegment, error types
// - mock_provider.rs: Fixed fixture for development and tests
// - deepgram_provider.rs: Managed diarizing speech recognition
// - local_provider.rs: Self-hosted ASR endpoint with bounded timeout

pub mod provider;
pub mod mock_provider;
pub mod deepgram_provider;
pub mod local_provider;

use std::sync::Arc;

use crate::config::{Config, TranscriptionProviderKind};
use crate::storage::AudioObjectStore;

pub use provider::{ProviderSegment, TranscriptionError, TranscriptionProvider};
pub use mock_provider::MockTranscriptionProvider;
pub use deepgram_provider::DeepgramTranscriptionProvider;
pub use local_provider::LocalTranscriptionProvider;

/// Select the active backend from validated configuration
///
/// Exactly one variant is active per process; selection carries no runtime
/// state beyond the backend's own client.
pub fn create_transcription_provider(
    config: &Config,
    store: Arc<dyn AudioObjectStore>,
) -> Arc<dyn TranscriptionProvider> {
    match config.transcription_provider {
        TranscriptionProviderKind::Mock => Arc::new(MockTranscriptionProvider),
        TranscriptionProviderKind::Managed => {
            Arc::new(DeepgramTranscriptionProvider::new(config.deepgram.clone(), store))
        }
        TranscriptionProviderKind::Local => {
            Arc::new(LocalTranscriptionProvider::new(config.local_asr.clone(), store))
        }
    }
}
