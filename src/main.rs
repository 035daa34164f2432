use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use tracing::info;

use inbox_voice_agent::config::AgentConfig;
use inbox_voice_agent::core::backend::BackendClient;
use inbox_voice_agent::core::orchestrator::TurnOrchestrator;
use inbox_voice_agent::core::sidechannel;
use inbox_voice_agent::core::speech::{SpeechSynthesizer, TtsController};
use inbox_voice_agent::livekit::audio::RoomSpeaker;
use inbox_voice_agent::livekit::{self, RoomDataSink, topics};
use inbox_voice_agent::session::{AgentSession, RoomVoice};

/// Inbox Voice Agent - voice bridge to the inbox assistant
#[derive(Parser, Debug)]
#[command(name = "inbox-voice-agent")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!(path = %config_path.display(), "loading configuration from file");
        AgentConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        AgentConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let backend = Arc::new(BackendClient::new(config.backend_base_url.clone())?);

    // One HTTP client shared across synthesizer rebuilds.
    let tts_http = reqwest::Client::new();
    let tts_endpoint = config.tts_endpoint.clone();
    let openai_api_key = config.openai_api_key.clone();
    let tts_instructions = config.tts_instructions.clone();
    let controller = Arc::new(TtsController::new(
        config.tts.clone(),
        Box::new(move |settings| {
            SpeechSynthesizer::new(
                tts_http.clone(),
                tts_endpoint.clone(),
                openai_api_key.clone(),
                settings.clone(),
                tts_instructions.clone(),
            )
        }),
    ));

    let (room, events) = livekit::connect(&config).await?;
    let room = Arc::new(room);

    let speaker = Arc::new(RoomSpeaker::publish(&room).await?);
    let voice = Arc::new(RoomVoice::new(controller.clone(), speaker));

    let sink = Arc::new(RoomDataSink::new(room.clone()));
    let (sources_tx, _sources_worker) = sidechannel::spawn(sink, topics::SOURCES);

    let orchestrator = Arc::new(TurnOrchestrator::new(backend, sources_tx, voice.clone()));
    let session = AgentSession::new(orchestrator, controller, voice);

    info!(room = %config.room_name, "agent ready");
    tokio::select! {
        _ = session.run(events) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }

    if let Err(e) = room.close().await {
        tracing::warn!(error = %e, "room close failed");
    }
    Ok(())
}
