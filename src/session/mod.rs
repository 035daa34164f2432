//! The per-room agent session.
//!
//! One session owns the room event stream and routes it:
//!
//! - transcript packets become conversational turns,
//! - control packets reconfigure speech in place,
//! - a disconnect ends the session.
//!
//! Turns are serialized through a single worker task with a one-slot queue.
//! A transcript arriving while a turn is in flight is dropped with a warning
//! rather than queued behind it; by the time a stale turn would run, the user
//! has moved on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use livekit::RoomEvent;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TrySendError};
use tracing::{debug, info, warn};

use crate::core::control::handle_control_packet;
use crate::core::orchestrator::TurnOrchestrator;
use crate::core::speech::{SpeechSink, TtsController};
use crate::livekit::audio::RoomSpeaker;
use crate::livekit::topics;

/// Packets on the transcript topic, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEvent {
    /// A final transcript of one user utterance.
    Transcript { text: String },
}

// =============================================================================
// Room Voice
// =============================================================================

/// [`SpeechSink`] over the room audio track.
///
/// Synthesizes through whatever engine the controller currently holds, so a
/// TTS config swap takes effect on the very next utterance. Failures are
/// logged and swallowed; a mute agent still completes its turn.
pub struct RoomVoice {
    controller: Arc<TtsController>,
    speaker: Arc<RoomSpeaker>,
    interruptible: AtomicBool,
}

impl RoomVoice {
    pub fn new(controller: Arc<TtsController>, speaker: Arc<RoomSpeaker>) -> Self {
        Self {
            controller,
            speaker,
            interruptible: AtomicBool::new(false),
        }
    }

    /// Cut off the current utterance, if it was spoken as interruptible.
    pub fn interrupt(&self) {
        if self.interruptible.load(Ordering::SeqCst) {
            debug!("barge-in: clearing queued audio");
            self.speaker.interrupt();
        }
    }
}

#[async_trait]
impl SpeechSink for RoomVoice {
    async fn say(&self, text: &str, allow_interruptions: bool) {
        if text.is_empty() {
            return;
        }
        self.interruptible
            .store(allow_interruptions, Ordering::SeqCst);

        let engine = self.controller.engine();
        match engine.synthesize(text).await {
            Ok(pcm) => {
                if let Err(e) = self.speaker.play_pcm(&pcm).await {
                    warn!(error = %e, "audio playback failed");
                }
            }
            Err(e) => warn!(error = %e, "speech synthesis failed"),
        }
    }
}

// =============================================================================
// Agent Session
// =============================================================================

pub struct AgentSession {
    orchestrator: Arc<TurnOrchestrator>,
    controller: Arc<TtsController>,
    voice: Arc<RoomVoice>,
}

impl AgentSession {
    pub fn new(
        orchestrator: Arc<TurnOrchestrator>,
        controller: Arc<TtsController>,
        voice: Arc<RoomVoice>,
    ) -> Self {
        Self {
            orchestrator,
            controller,
            voice,
        }
    }

    /// Drive the session until the room disconnects or the event stream ends.
    pub async fn run(self, mut events: UnboundedReceiver<RoomEvent>) {
        // One-slot turn queue; see module docs for the drop policy.
        let (turn_tx, mut turn_rx) = mpsc::channel::<String>(1);

        let orchestrator = self.orchestrator.clone();
        let voice = self.voice.clone();
        let worker = tokio::spawn(async move {
            while let Some(question) = turn_rx.recv().await {
                let reply = orchestrator.handle_turn(&question).await;
                voice.say(&reply, true).await;
            }
        });

        while let Some(event) = events.recv().await {
            match event {
                RoomEvent::DataReceived { payload, topic, .. } => match topic.as_deref() {
                    Some(topics::TTS_CONFIG) => {
                        handle_control_packet(&payload, &self.controller);
                    }
                    Some(topics::TRANSCRIPT) => {
                        self.handle_transcript_packet(&payload, &turn_tx);
                    }
                    other => {
                        debug!(topic = ?other, "ignoring data packet");
                    }
                },
                RoomEvent::Disconnected { reason } => {
                    info!(?reason, "room disconnected, ending session");
                    break;
                }
                _ => {}
            }
        }

        drop(turn_tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "turn worker ended abnormally");
        }
    }

    fn handle_transcript_packet(&self, payload: &[u8], turn_tx: &mpsc::Sender<String>) {
        let event = match serde_json::from_slice::<TranscriptEvent>(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "failed to parse transcript packet");
                return;
            }
        };

        let TranscriptEvent::Transcript { text } = event;
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        info!(%text, "user said");

        // New user speech cuts off any interruptible utterance right away,
        // even if the turn itself gets dropped below.
        self.voice.interrupt();

        match turn_tx.try_send(text) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("turn already in progress, dropping transcript");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("turn worker gone, dropping transcript");
            }
        }
    }
}
