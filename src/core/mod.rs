pub mod backend;
pub mod classifier;
pub mod control;
pub mod orchestrator;
pub mod sidechannel;
pub mod speech;

// Re-export commonly used types for convenience
pub use backend::{AskResponse, BackendClient, InboxBackend, JobSnapshot, JobStatus, Source};
pub use control::{ControlMessage, handle_control_packet};
pub use orchestrator::{PollPolicy, TurnOrchestrator};
pub use sidechannel::{DataSink, PublishError, SidechannelHandle, SourcesEvent};
pub use speech::{SpeechSink, SpeechSynthesizer, TtsController, TtsSettings};
