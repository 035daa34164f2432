//! Agent configuration.
//!
//! Sources, in priority order: YAML file (via `--config`) > environment
//! variables > defaults. A `.env` file is loaded by the binary before this
//! module runs, so `.env` values arrive here as plain environment variables.
//!
//! # Environment variables
//!
//! ```bash
//! APP_BASE_URL=http://localhost:3000       # inbox assistant API
//! LIVEKIT_URL=ws://localhost:7880
//! LIVEKIT_API_KEY=...
//! LIVEKIT_API_SECRET=...
//! LIVEKIT_ROOM=voice-inbox
//! OPENAI_API_KEY=sk-...
//! OPENAI_TTS_MODEL=gpt-4o-mini-tts
//! OPENAI_TTS_VOICE=coral
//! OPENAI_TTS_INSTRUCTIONS="..."
//! ```

use std::env;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::core::speech::{
    DEFAULT_TTS_INSTRUCTIONS, DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE, OPENAI_SPEECH_URL, TtsSettings,
};

/// Default inbox assistant base URL.
pub const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";

/// Default LiveKit server URL.
pub const DEFAULT_LIVEKIT_URL: &str = "ws://localhost:7880";

/// Default room the agent joins.
pub const DEFAULT_ROOM: &str = "voice-inbox";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Everything the agent needs to join a room and serve turns.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the inbox assistant API (`/api/assistant/*`).
    pub backend_base_url: Url,

    // LiveKit settings
    pub livekit_url: String,
    pub livekit_api_key: String,
    pub livekit_api_secret: String,
    pub room_name: String,

    // Speech synthesis
    pub openai_api_key: String,
    pub tts: TtsSettings,
    pub tts_instructions: String,
    /// Speech endpoint, overridable for self-hosted gateways and tests.
    pub tts_endpoint: Url,
}

/// YAML file shape; every field optional, falling back to env/defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    app_base_url: Option<String>,
    livekit_url: Option<String>,
    livekit_api_key: Option<String>,
    livekit_api_secret: Option<String>,
    room: Option<String>,
    openai_api_key: Option<String>,
    tts_model: Option<String>,
    tts_voice: Option<String>,
    tts_instructions: Option<String>,
    tts_endpoint: Option<String>,
}

impl AgentConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(FileConfig::default())
    }

    /// Load configuration from a YAML file, with environment fallbacks.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let file: FileConfig = serde_yaml::from_str(&contents)?;
        Self::build(file)
    }

    fn build(file: FileConfig) -> Result<Self, ConfigError> {
        let backend_base_url = file
            .app_base_url
            .or_else(|| env_var("APP_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_string());
        let backend_base_url = Url::parse(&backend_base_url).map_err(|e| ConfigError::Invalid {
            field: "app_base_url",
            reason: e.to_string(),
        })?;

        let tts_endpoint = file
            .tts_endpoint
            .or_else(|| env_var("OPENAI_TTS_ENDPOINT"))
            .unwrap_or_else(|| OPENAI_SPEECH_URL.to_string());
        let tts_endpoint = Url::parse(&tts_endpoint).map_err(|e| ConfigError::Invalid {
            field: "tts_endpoint",
            reason: e.to_string(),
        })?;

        Ok(Self {
            backend_base_url,
            livekit_url: file
                .livekit_url
                .or_else(|| env_var("LIVEKIT_URL"))
                .unwrap_or_else(|| DEFAULT_LIVEKIT_URL.to_string()),
            livekit_api_key: file
                .livekit_api_key
                .or_else(|| env_var("LIVEKIT_API_KEY"))
                .ok_or(ConfigError::Missing("LIVEKIT_API_KEY"))?,
            livekit_api_secret: file
                .livekit_api_secret
                .or_else(|| env_var("LIVEKIT_API_SECRET"))
                .ok_or(ConfigError::Missing("LIVEKIT_API_SECRET"))?,
            room_name: file
                .room
                .or_else(|| env_var("LIVEKIT_ROOM"))
                .unwrap_or_else(|| DEFAULT_ROOM.to_string()),
            openai_api_key: file
                .openai_api_key
                .or_else(|| env_var("OPENAI_API_KEY"))
                .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
            tts: TtsSettings {
                model: file
                    .tts_model
                    .or_else(|| env_var("OPENAI_TTS_MODEL"))
                    .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
                voice: file
                    .tts_voice
                    .or_else(|| env_var("OPENAI_TTS_VOICE"))
                    .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            },
            tts_instructions: file
                .tts_instructions
                .or_else(|| env_var("OPENAI_TTS_INSTRUCTIONS"))
                .unwrap_or_else(|| DEFAULT_TTS_INSTRUCTIONS.to_string()),
            tts_endpoint,
        })
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
