//! OpenAI speech synthesis client.
//!
//! One HTTP call per utterance: `POST /v1/audio/speech` with the configured
//! model, voice and speaking-style instructions, requesting raw PCM so the
//! bytes can be captured straight onto the room audio track.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.openai.com/v1/audio/speech`
//! - PCM output: 24 kHz 16-bit mono little-endian

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::TtsSettings;

/// OpenAI speech API endpoint.
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Sample rate of OpenAI PCM output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of OpenAI PCM output.
pub const SPEECH_CHANNELS: u32 = 1;

/// Per-utterance synthesis timeout.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure while synthesizing an utterance.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("speech API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Handle to the speech API for one (model, voice) pair.
///
/// Rebuilt by [`TtsController`](super::TtsController) whenever the settings
/// actually change; the HTTP client inside is shared across rebuilds.
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    http: Client,
    endpoint: Url,
    api_key: String,
    settings: TtsSettings,
    instructions: String,
}

impl SpeechSynthesizer {
    pub fn new(
        http: Client,
        endpoint: Url,
        api_key: String,
        settings: TtsSettings,
        instructions: String,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            settings,
            instructions,
        }
    }

    /// The settings this synthesizer was built from.
    pub fn settings(&self) -> &TtsSettings {
        &self.settings
    }

    /// Synthesize `text` to raw PCM (24 kHz 16-bit mono).
    pub async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        let body = json!({
            "model": self.settings.model,
            "input": text,
            "voice": self.settings.voice,
            "instructions": self.instructions,
            "response_format": "pcm",
        });

        debug!(model = %self.settings.model, voice = %self.settings.voice, "synthesizing utterance");
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .timeout(SYNTHESIS_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?)
    }
}
