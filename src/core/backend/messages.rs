//! Wire types for the inbox assistant API.
//!
//! The ask endpoint answers with shape-dependent JSON: a direct answer, a
//! `"status":"processing"` acknowledgment carrying a job id, or an error body.
//! That shape is classified exactly once, here at the boundary, into the
//! tagged [`AskResponse`] — downstream code never re-inspects raw JSON.

use serde::{Deserialize, Serialize};

/// Fallback message when an error body carries nothing usable.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// =============================================================================
// Ask Response
// =============================================================================

/// Classified response of the ask endpoint.
///
/// Decided once from the HTTP status and body; every turn-path failure
/// (transport, decode, HTTP >= 400) collapses into `Error` so the caller
/// always has a displayable message and never a raw exception.
#[derive(Debug, Clone, PartialEq)]
pub enum AskResponse {
    /// The backend answered synchronously.
    Immediate {
        answer: Option<String>,
        sources: Vec<Source>,
    },
    /// The backend started a long-running job; poll it to completion.
    Processing {
        message: Option<String>,
        job_id: Option<String>,
    },
    /// The request failed; `message` is always displayable.
    Error { message: String },
}

/// Raw body of a successful ask response, before classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AskReply {
    pub status: Option<String>,
    pub message: Option<String>,
    pub job_id: Option<String>,
    pub answer: Option<String>,
    // `sources` may be absent or null; both mean "no sources".
    pub sources: Option<Vec<Source>>,
}

impl AskReply {
    /// Classify the raw body into the tagged response.
    pub(crate) fn classify(self) -> AskResponse {
        if self.status.as_deref() == Some("processing") {
            AskResponse::Processing {
                message: self.message,
                job_id: self.job_id,
            }
        } else {
            AskResponse::Immediate {
                answer: self.answer,
                sources: self.sources.unwrap_or_default(),
            }
        }
    }
}

/// Error body shape used by the assistant API.
#[derive(Debug, Clone, Deserialize)]
struct ErrorReply {
    error: Option<String>,
    message: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Preference order: JSON `error` field, JSON `message` field, the raw body
/// text, then [`UNKNOWN_ERROR`]. Never fails.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(reply) = serde_json::from_str::<ErrorReply>(body)
        && let Some(message) = reply.error.or(reply.message)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Job Status
// =============================================================================

/// Terminal-or-pending status of a backend job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is still running.
    Pending,
    /// Job finished; `answer` holds the result.
    Done,
    /// Job failed; `error` holds the reason.
    Error,
    /// Unrecognized status value — treated like pending by the poll loop.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// True once the job cannot change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// One observation of a backend job, as returned by the job status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<Source>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Source>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sources: Option<Vec<Source>> = Option::deserialize(deserializer)?;
    Ok(sources.unwrap_or_default())
}

// =============================================================================
// Sources
// =============================================================================

/// A structured reference supporting an answer (e.g. an email or attachment).
///
/// The agent does not interpret sources beyond their existence: the `id` is
/// lifted out for logging and everything else rides along untouched so the
/// observer UI sees exactly what the backend produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> AskReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classify_immediate() {
        let response = reply(json!({
            "answer": "You have 3 unread emails.",
            "sources": [{"id": "m1"}]
        }))
        .classify();

        match response {
            AskResponse::Immediate { answer, sources } => {
                assert_eq!(answer.as_deref(), Some("You have 3 unread emails."));
                assert_eq!(sources.len(), 1);
                assert_eq!(sources[0].id.as_deref(), Some("m1"));
            }
            other => panic!("expected Immediate, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_immediate_null_sources() {
        let response = reply(json!({"answer": "Nothing new.", "sources": null})).classify();
        match response {
            AskResponse::Immediate { sources, .. } => assert!(sources.is_empty()),
            other => panic!("expected Immediate, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_processing() {
        let response = reply(json!({
            "status": "processing",
            "message": "Extracting attachments...",
            "jobId": "j1"
        }))
        .classify();

        assert_eq!(
            response,
            AskResponse::Processing {
                message: Some("Extracting attachments...".to_string()),
                job_id: Some("j1".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_processing_without_job_id() {
        let response = reply(json!({"status": "processing"})).classify();
        assert_eq!(
            response,
            AskResponse::Processing {
                message: None,
                job_id: None,
            }
        );
    }

    #[test]
    fn test_non_processing_status_is_immediate() {
        // Only "processing" selects the job path.
        let response = reply(json!({"status": "ok", "answer": "Done."})).classify();
        assert!(matches!(response, AskResponse::Immediate { .. }));
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = r#"{"error":"not found","message":"ignored"}"#;
        assert_eq!(extract_error_message(body), "not found");
    }

    #[test]
    fn test_error_message_falls_back_to_message_field() {
        let body = r#"{"message":"upstream unavailable"}"#;
        assert_eq!(extract_error_message(body), "upstream unavailable");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(extract_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_error_message_unknown_on_empty_body() {
        assert_eq!(extract_error_message(""), UNKNOWN_ERROR);
        assert_eq!(extract_error_message("   "), UNKNOWN_ERROR);
        // Valid JSON with neither field also falls through to the raw text.
        assert_eq!(extract_error_message("{}"), "{}");
    }

    #[test]
    fn test_job_snapshot_decoding() {
        let snapshot: JobSnapshot =
            serde_json::from_str(r#"{"status":"done","answer":"Done."}"#).unwrap();
        assert_eq!(snapshot.status, JobStatus::Done);
        assert!(snapshot.status.is_terminal());
        assert_eq!(snapshot.answer.as_deref(), Some("Done."));
        assert!(snapshot.sources.is_empty());
    }

    #[test]
    fn test_job_snapshot_unknown_status() {
        let snapshot: JobSnapshot = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert_eq!(snapshot.status, JobStatus::Unknown);
        assert!(!snapshot.status.is_terminal());
    }

    #[test]
    fn test_job_snapshot_null_sources() {
        let snapshot: JobSnapshot =
            serde_json::from_str(r#"{"status":"done","sources":null}"#).unwrap();
        assert!(snapshot.sources.is_empty());
    }

    #[test]
    fn test_source_passthrough_fields_survive() {
        let raw = json!({"id": "m1", "subject": "Q3 report", "score": 0.92});
        let source: Source = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(source.id.as_deref(), Some("m1"));
        assert_eq!(serde_json::to_value(&source).unwrap(), raw);
    }
}
