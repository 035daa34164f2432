//! LiveKit room glue: data topics, token minting, room connection, and the
//! data-channel sink used by the side-channel publisher.
//!
//! Everything here is thin I/O around the SDK; the conversational logic in
//! `core` only sees the `DataSink` and `SpeechSink` traits.

pub mod audio;

use std::sync::Arc;

use async_trait::async_trait;
use livekit::{DataPacket, Room, RoomEvent, RoomOptions};
use livekit_api::access_token::{AccessToken, AccessTokenError, VideoGrants};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::core::sidechannel::{DataSink, PublishError};

/// Data topics shared with the web UI.
pub mod topics {
    /// Outbound: answer sources for UI observers.
    pub const SOURCES: &str = "inbox.sources";
    /// Inbound: live TTS configuration changes.
    pub const TTS_CONFIG: &str = "inbox.tts.config";
    /// Inbound: final transcripts from the upstream speech pipeline.
    pub const TRANSCRIPT: &str = "inbox.transcript";
}

#[derive(Debug, Error)]
pub enum LiveKitError {
    #[error("failed to mint access token: {0}")]
    Token(#[from] AccessTokenError),

    #[error("room connection failed: {0}")]
    Room(#[from] livekit::RoomError),
}

/// Mint a room token for the agent participant.
pub fn mint_agent_token(config: &AgentConfig, identity: &str) -> Result<String, LiveKitError> {
    let token = AccessToken::with_api_key(&config.livekit_api_key, &config.livekit_api_secret)
        .with_identity(identity)
        .with_name("Voice Inbox Agent")
        .with_grants(VideoGrants {
            room_join: true,
            room: config.room_name.clone(),
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            agent: true,
            ..Default::default()
        })
        .to_jwt()?;
    Ok(token)
}

/// Connect the agent to its room.
pub async fn connect(
    config: &AgentConfig,
) -> Result<(Room, UnboundedReceiver<RoomEvent>), LiveKitError> {
    let suffix = Uuid::new_v4().simple().to_string();
    let identity = format!("agent-{}", &suffix[..6]);
    let token = mint_agent_token(config, &identity)?;

    info!(room = %config.room_name, "connecting agent to room");
    let (room, events) = Room::connect(&config.livekit_url, &token, RoomOptions::default()).await?;
    info!(%identity, "connected");

    Ok((room, events))
}

/// Reliable data-channel sink over the room's local participant.
pub struct RoomDataSink {
    room: Arc<Room>,
}

impl RoomDataSink {
    pub fn new(room: Arc<Room>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl DataSink for RoomDataSink {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.room
            .local_participant()
            .publish_data(DataPacket {
                payload,
                topic: Some(topic.to_string()),
                reliable: true,
                ..Default::default()
            })
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}
