// Worker configuration
// All settings come from the environment (plus .env) and are validated once at startup

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Which transcription backend is active for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionProviderKind {
    Mock,
    Managed,
    Local,
}

impl FromStr for TranscriptionProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mock" => Ok(Self::Mock),
            "managed" => Ok(Self::Managed),
            "local" => Ok(Self::Local),
            other => bail!("Unknown transcription provider '{}' (expected mock, managed, or local)", other),
        }
    }
}

/// Which notes backend is active (the heuristic is always available as fallback)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesProviderKind {
    Heuristic,
    Ollama,
}

impl FromStr for NotesProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heuristic" => Ok(Self::Heuristic),
            "ollama" => Ok(Self::Ollama),
            other => bail!("Unknown notes provider '{}' (expected heuristic or ollama)", other),
        }
    }
}

/// Storage gateway settings (the service that owns bucket credentials)
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
    pub signed_download_expires_sec: u64,
}

/// Audio retention sweep settings
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub enabled: bool,
    pub days: u32,
    pub sweep_minutes: u64,
    pub batch_size: u32,
}

/// Managed (Deepgram) transcription settings
#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub language: Option<String>,
    pub endpoint: String,
}

/// Self-hosted ASR endpoint settings
#[derive(Debug, Clone)]
pub struct LocalAsrConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

/// Notes generation settings
#[derive(Debug, Clone)]
pub struct NotesConfig {
    pub provider: NotesProviderKind,
    pub ollama_endpoint: String,
    pub ollama_model: String,
    pub ollama_timeout_ms: u64,
}

/// Complete worker configuration, parsed once at process start
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub queue_poll_interval_ms: u64,
    pub transcription_provider: TranscriptionProviderKind,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub deepgram: DeepgramConfig,
    pub local_asr: LocalAsrConfig,
    pub notes: NotesConfig,
}

impl Config {
    /// Load and validate configuration from the environment
    pub fn from_env() -> Result<Self> {
        let database_path = match env_string("MEETNOTES_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_database_path(),
        };

        let config = Self {
            database_path,
            queue_poll_interval_ms: env_parse("QUEUE_POLL_INTERVAL_MS", 500)?,
            transcription_provider: env_parse("TRANSCRIPTION_PROVIDER", TranscriptionProviderKind::Mock)?,
            storage: StorageConfig {
                gateway_url: env_string("STORAGE_GATEWAY_URL"),
                gateway_token: env_string("STORAGE_GATEWAY_TOKEN"),
                signed_download_expires_sec: env_parse("SIGNED_DOWNLOAD_EXPIRES_SEC", 900)?,
            },
            retention: RetentionConfig {
                enabled: env_bool("AUDIO_RETENTION_ENABLED", false)?,
                days: env_parse("AUDIO_RETENTION_DAYS", 30)?,
                sweep_minutes: env_parse("AUDIO_RETENTION_SWEEP_MINUTES", 60)?,
                batch_size: env_parse("AUDIO_RETENTION_BATCH_SIZE", 100)?,
            },
            deepgram: DeepgramConfig {
                api_key: env_string("DEEPGRAM_API_KEY"),
                model: env_string("DEEPGRAM_MODEL").unwrap_or_else(|| "nova-2".to_string()),
                language: env_string("DEEPGRAM_LANGUAGE"),
                endpoint: env_string("DEEPGRAM_ENDPOINT")
                    .unwrap_or_else(|| "https://api.deepgram.com/v1/listen".to_string()),
            },
            local_asr: LocalAsrConfig {
                endpoint: env_string("LOCAL_ASR_ENDPOINT"),
                api_key: env_string("LOCAL_ASR_API_KEY"),
                timeout_ms: env_parse("LOCAL_ASR_TIMEOUT_MS", 120_000)?,
            },
            notes: NotesConfig {
                provider: env_parse("NOTES_PROVIDER", NotesProviderKind::Heuristic)?,
                ollama_endpoint: env_string("OLLAMA_ENDPOINT")
                    .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string()),
                ollama_model: env_string("OLLAMA_MODEL").unwrap_or_else(|| "llama3.1".to_string()),
                ollama_timeout_ms: env_parse("OLLAMA_TIMEOUT_MS", 120_000)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.queue_poll_interval_ms == 0 {
            bail!("QUEUE_POLL_INTERVAL_MS must be positive");
        }
        if self.storage.signed_download_expires_sec == 0 {
            bail!("SIGNED_DOWNLOAD_EXPIRES_SEC must be positive");
        }
        if self.retention.enabled {
            if self.retention.days == 0 {
                bail!("AUDIO_RETENTION_DAYS must be positive");
            }
            if self.retention.sweep_minutes == 0 {
                bail!("AUDIO_RETENTION_SWEEP_MINUTES must be positive");
            }
            if self.retention.batch_size == 0 {
                bail!("AUDIO_RETENTION_BATCH_SIZE must be positive");
            }
        }
        if self.local_asr.timeout_ms == 0 {
            bail!("LOCAL_ASR_TIMEOUT_MS must be positive");
        }
        if self.notes.ollama_timeout_ms == 0 {
            bail!("OLLAMA_TIMEOUT_MS must be positive");
        }
        Ok(())
    }
}

/// Default database location under the platform data directory
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meetnotes-worker")
        .join("meetnotes.db")
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match env_string(key) {
        Some(raw) => match raw.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => bail!("Invalid value for {}: '{}' (expected true/false)", key, other),
        },
        None => Ok(default),
    }
}
