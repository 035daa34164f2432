//! Turn orchestration.
//!
//! One call to [`TurnOrchestrator::handle_turn`] is one conversational turn:
//! it always resolves to exactly one string to speak back, whatever the
//! backend does. The path through a turn is
//!
//! ```text
//! Classifying -> SmallTalkReply
//!             -> Asking -> ImmediateAnswer
//!                       -> ProcessingWait -> Polling -> Done | JobError | TimedOut
//!                       -> error reply
//! ```
//!
//! The processing path speaks an acknowledgment first (interruptible — the
//! user cutting it off does not cancel the poll), then polls the job at a
//! fixed cadence against a hard attempt cap. Interval and cap are the
//! system's worst-case latency contract, so they live here as named
//! constants rather than inline literals.

use std::time::Duration;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::backend::{AskResponse, InboxBackend, JobStatus};
use crate::core::classifier;
use crate::core::sidechannel::SidechannelHandle;
use crate::core::speech::SpeechSink;

// =============================================================================
// Constants
// =============================================================================

/// Delay between job status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Hard cap on poll attempts (~90 s wall clock with [`POLL_INTERVAL`]).
pub const MAX_POLL_ATTEMPTS: u32 = 45;

/// Reply to small talk; steers the user toward real questions.
pub const SMALL_TALK_REPLY: &str = "Hi! Ask me anything about your inbox, emails, or attachments.";

/// Spoken while a background job runs, unless the backend supplies its own.
pub const DEFAULT_PROCESSING_ACK: &str = "This may take a minute.";

/// Reply when an immediate response carries no answer text.
pub const NO_ANSWER_REPLY: &str = "No answer returned.";

/// Reply when a processing response carries no job id.
pub const JOB_START_FAILED_REPLY: &str = "I couldn't start the background job.";

/// Reply when the poll budget runs out before the job finishes.
pub const TIMEOUT_REPLY: &str = "That is taking longer than expected. Please try again.";

// =============================================================================
// Poll Policy
// =============================================================================

/// Bounded-wait policy for the job poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

// =============================================================================
// Turn Orchestrator
// =============================================================================

/// Drives a question from transcript to spoken reply.
pub struct TurnOrchestrator {
    backend: Arc<dyn InboxBackend>,
    sidechannel: SidechannelHandle,
    speech: Arc<dyn SpeechSink>,
    policy: PollPolicy,
}

impl TurnOrchestrator {
    pub fn new(
        backend: Arc<dyn InboxBackend>,
        sidechannel: SidechannelHandle,
        speech: Arc<dyn SpeechSink>,
    ) -> Self {
        Self::with_policy(backend, sidechannel, speech, PollPolicy::default())
    }

    pub fn with_policy(
        backend: Arc<dyn InboxBackend>,
        sidechannel: SidechannelHandle,
        speech: Arc<dyn SpeechSink>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            backend,
            sidechannel,
            speech,
            policy,
        }
    }

    /// Run one turn. Always returns a reply to speak; never errors.
    pub async fn handle_turn(&self, question: &str) -> String {
        if classifier::is_small_talk(question) {
            debug!("small talk handled locally");
            return SMALL_TALK_REPLY.to_string();
        }

        match self.backend.ask(question).await {
            AskResponse::Error { message } => {
                format!("I couldn't reach the inbox service: {message}")
            }
            AskResponse::Immediate { answer, sources } => {
                // Sources are dispatched before the reply leaves this turn;
                // the publish itself happens off the answer path.
                self.sidechannel.dispatch(sources);
                answer.unwrap_or_else(|| NO_ANSWER_REPLY.to_string())
            }
            AskResponse::Processing { message, job_id } => {
                // Long-running work: speak first, then poll.
                let ack = message.unwrap_or_else(|| DEFAULT_PROCESSING_ACK.to_string());
                self.speech.say(&ack, true).await;

                let Some(job_id) = job_id else {
                    warn!("processing response without job id");
                    return JOB_START_FAILED_REPLY.to_string();
                };
                self.poll_until_settled(&job_id).await
            }
        }
    }

    /// Poll the job to a terminal state within the attempt budget.
    ///
    /// A failed fetch costs an attempt just like a pending status; the loop
    /// only ends on `done`, `error`, or budget exhaustion.
    async fn poll_until_settled(&self, job_id: &str) -> String {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            let Some(snapshot) = self.backend.poll_job(job_id).await else {
                continue;
            };

            match snapshot.status {
                JobStatus::Done => {
                    info!(%job_id, attempt, "job finished");
                    self.sidechannel.dispatch(snapshot.sources);
                    return snapshot.answer.unwrap_or_default();
                }
                JobStatus::Error => {
                    let reason = snapshot.error.unwrap_or_else(|| "unknown".to_string());
                    warn!(%job_id, attempt, %reason, "job failed");
                    return format!("There was an error: {reason}");
                }
                JobStatus::Pending | JobStatus::Unknown => {}
            }
        }

        warn!(%job_id, attempts = self.policy.max_attempts, "job poll budget exhausted");
        TIMEOUT_REPLY.to_string()
    }
}
