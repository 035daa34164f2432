//! HTTP client for the inbox assistant API.
//!
//! Two operations back the conversational turn:
//!
//! 1. `ask` — forwards a question to `POST /api/assistant/ask`. Whatever
//!    happens on the wire, the caller gets an [`AskResponse`]; failures are
//!    degraded into `AskResponse::Error` with a displayable message.
//! 2. `poll_job` — a single `GET /api/assistant/jobs/{id}` status fetch.
//!    Any failure here is transient by contract: it is logged and reported as
//!    `None` so the poll loop simply spends one of its attempts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::messages::{AskReply, AskResponse, JobSnapshot, extract_error_message};
use super::{BackendError, InboxBackend};

// =============================================================================
// Constants
// =============================================================================

/// Request timeout for the ask endpoint. Bounds a whole synchronous turn.
const ASK_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout shared by all backend requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle pooled connections are closed after this long.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("inbox-voice-agent/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Backend Client
// =============================================================================

/// Reqwest-backed implementation of [`InboxBackend`].
///
/// The client is cheap to clone and pools connections; one instance serves
/// the whole session.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client for the assistant API rooted at `base_url`.
    pub fn new(base_url: Url) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(ASK_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BackendError::ClientBuild(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl InboxBackend for BackendClient {
    async fn ask(&self, question: &str) -> AskResponse {
        let url = match self.endpoint("/api/assistant/ask") {
            Ok(url) => url,
            Err(e) => return AskResponse::Error { message: e.to_string() },
        };

        debug!(%url, "forwarding question to inbox assistant");
        let response = match self
            .http
            .post(url)
            .json(&json!({ "question": question }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "ask request failed");
                return AskResponse::Error { message: e.to_string() };
            }
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            warn!(status = status.as_u16(), %message, "inbox assistant returned an error");
            return AskResponse::Error { message };
        }

        match response.json::<AskReply>().await {
            Ok(reply) => reply.classify(),
            Err(e) => {
                warn!(error = %e, "failed to decode ask response");
                AskResponse::Error { message: e.to_string() }
            }
        }
    }

    async fn poll_job(&self, job_id: &str) -> Option<JobSnapshot> {
        let url = match self.endpoint(&format!("/api/assistant/jobs/{job_id}")) {
            Ok(url) => url,
            Err(e) => {
                warn!(%job_id, error = %e, "invalid job status url");
                return None;
            }
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%job_id, error = %e, "job status request failed, will retry");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(
                %job_id,
                status = response.status().as_u16(),
                "job status fetch skipped"
            );
            return None;
        }

        match response.json::<JobSnapshot>().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(%job_id, error = %e, "failed to decode job snapshot, will retry");
                None
            }
        }
    }
}
