//! Speech output: TTS settings, the OpenAI synthesizer, and the hot-swap
//! controller.
//!
//! The orchestrator only ever talks to the [`SpeechSink`] trait; the
//! production sink (in `session`) synthesizes through the active
//! [`SpeechSynthesizer`] and plays onto the room audio track. The active
//! synthesizer is owned by [`TtsController`] and can be swapped mid-session
//! from a control message without restarting anything.

pub mod controller;
pub mod synthesizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use controller::TtsController;
pub use synthesizer::{
    OPENAI_SPEECH_URL, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, SpeechError, SpeechSynthesizer,
};

/// Default TTS model.
pub const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";

/// Default TTS voice.
pub const DEFAULT_TTS_VOICE: &str = "coral";

/// Default speaking-style instructions passed with every synthesis request.
pub const DEFAULT_TTS_INSTRUCTIONS: &str = "Speak in a natural, conversational tone at a \
     moderate pace. Use brief pauses between thoughts and slight variation in intonation. \
     Avoid a robotic cadence.";

/// The (model, voice) pair the speech engine is built from.
///
/// Readers always observe a complete pair: the controller swaps the whole
/// struct atomically, never one field at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsSettings {
    pub model: String,
    pub voice: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
        }
    }
}

/// Where spoken replies go.
///
/// Implementations must degrade failures internally (log and continue): a
/// broken speaker never fails the conversational turn, which still has to
/// return its reply string.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak `text`. When `allow_interruptions` is set, new user speech may
    /// cut this utterance off.
    async fn say(&self, text: &str, allow_interruptions: bool);
}
