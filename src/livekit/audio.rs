//! Agent voice track: publishes a microphone-source audio track and captures
//! synthesized PCM into it in 10 ms frames. `interrupt` drops any queued
//! audio so a new utterance can cut in immediately.

use livekit::Room;
use livekit::options::TrackPublishOptions;
use livekit::track::{LocalAudioTrack, LocalTrack, TrackSource};
use livekit::webrtc::audio_source::native::NativeAudioSource;
use livekit::webrtc::prelude::{AudioFrame, AudioSourceOptions, RtcAudioSource, RtcError};
use thiserror::Error;
use tracing::debug;

use crate::core::speech::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};

/// Frame size captured per call, in milliseconds.
const FRAME_MS: u32 = 10;

/// Audio buffered inside the source before capture backpressures.
const SOURCE_QUEUE_MS: u32 = 1000;

const TRACK_NAME: &str = "agent-voice";

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to publish audio track: {0}")]
    Publish(#[from] livekit::RoomError),

    #[error("failed to capture audio frame: {0}")]
    Capture(#[from] RtcError),
}

/// The agent's published voice track.
pub struct RoomSpeaker {
    source: NativeAudioSource,
}

impl RoomSpeaker {
    /// Create the audio source and publish it as the agent's microphone track.
    pub async fn publish(room: &Room) -> Result<Self, PlaybackError> {
        let source = NativeAudioSource::new(
            AudioSourceOptions::default(),
            SPEECH_SAMPLE_RATE,
            SPEECH_CHANNELS,
            SOURCE_QUEUE_MS,
        );
        let track =
            LocalAudioTrack::create_audio_track(TRACK_NAME, RtcAudioSource::Native(source.clone()));
        room.local_participant()
            .publish_track(
                LocalTrack::Audio(track),
                TrackPublishOptions {
                    source: TrackSource::Microphone,
                    ..Default::default()
                },
            )
            .await?;
        debug!(track = TRACK_NAME, "published agent audio track");

        Ok(Self { source })
    }

    /// Capture 16-bit little-endian mono PCM into the track. Blocks while the
    /// source queue is full, so playback of one utterance is naturally paced.
    pub async fn play_pcm(&self, pcm: &[u8]) -> Result<(), PlaybackError> {
        let samples_per_frame = (SPEECH_SAMPLE_RATE * FRAME_MS / 1000) as usize;
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        for frame in samples.chunks(samples_per_frame) {
            self.source
                .capture_frame(&AudioFrame {
                    data: frame.into(),
                    sample_rate: SPEECH_SAMPLE_RATE,
                    num_channels: SPEECH_CHANNELS,
                    samples_per_channel: (frame.len() / SPEECH_CHANNELS as usize) as u32,
                })
                .await?;
        }
        Ok(())
    }

    /// Drop any queued audio immediately.
    pub fn interrupt(&self) {
        self.source.clear_buffer();
    }
}
