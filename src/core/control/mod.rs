//! Inbound control-message dispatch.
//!
//! The web UI drives live configuration over a dedicated data topic. Packets
//! are internally tagged; anything that does not decode to a known message —
//! wrong `type`, truncated JSON, non-UTF-8 bytes — is logged at warn and
//! dropped. This path must never panic into the session event loop.

use serde::Deserialize;
use tracing::warn;

use crate::core::speech::TtsController;

/// Recognized control messages, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// `{"type":"tts_config","model"?,"voice"?}` — hot-swap the TTS pair.
    TtsConfig {
        model: Option<String>,
        voice: Option<String>,
    },
}

/// Decode and apply one control packet. Malformed input is dropped.
pub fn handle_control_packet(payload: &[u8], controller: &TtsController) {
    match serde_json::from_slice::<ControlMessage>(payload) {
        Ok(ControlMessage::TtsConfig { model, voice }) => {
            controller.update(model, voice);
        }
        Err(e) => {
            warn!(error = %e, "failed to parse control message");
        }
    }
}
