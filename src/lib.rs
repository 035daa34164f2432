pub mod config;
pub mod core;
pub mod livekit;
pub mod session;

// Re-export commonly used items for convenience
pub use config::{AgentConfig, ConfigError};
pub use core::*;
pub use session::{AgentSession, RoomVoice};
