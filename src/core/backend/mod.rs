//! Inbox assistant API integration.
//!
//! The assistant lives behind a plain HTTP API (the agent is only one of its
//! clients). This module owns the wire types and the client, and exposes the
//! [`InboxBackend`] trait so the turn orchestrator can be exercised against
//! in-memory fakes in tests.
//!
//! # Endpoints
//!
//! - `POST /api/assistant/ask` — body `{"question": string}`; answers with
//!   either `{answer, sources?}`, `{"status":"processing", message?, jobId}`,
//!   or an error status with `{error|message}`.
//! - `GET /api/assistant/jobs/{id}` — `{status, answer?, error?, sources?}`.

mod client;
pub mod messages;


use async_trait::async_trait;
use thiserror::Error;

pub use client::BackendClient;
pub use messages::{AskResponse, JobSnapshot, JobStatus, Source, UNKNOWN_ERROR};

/// Errors raised while constructing the backend client.
///
/// Runtime request failures never surface as errors: `ask` degrades them into
/// [`AskResponse::Error`] and `poll_job` swallows them per attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

/// The inbox assistant as seen by the turn orchestrator.
#[async_trait]
pub trait InboxBackend: Send + Sync {
    /// Forward a question. Infallible by contract: every failure mode comes
    /// back as [`AskResponse::Error`] with a displayable message.
    async fn ask(&self, question: &str) -> AskResponse;

    /// Fetch one job status snapshot. `None` means the attempt was wasted
    /// (non-200, transport or decode failure) and the poll loop should
    /// continue against its own budget.
    async fn poll_job(&self, job_id: &str) -> Option<JobSnapshot>;
}
