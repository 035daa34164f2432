//! End-to-end turn flow over a mocked inbox assistant API.
//!
//! These run the real [`BackendClient`] against wiremock, so the JSON on the
//! wire is exactly what production sends. The poll cadence is shortened via
//! [`PollPolicy`]; the production interval and cap are covered by unit tests
//! with a paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inbox_voice_agent::core::backend::BackendClient;
use inbox_voice_agent::core::orchestrator::{
    DEFAULT_PROCESSING_ACK, JOB_START_FAILED_REPLY, PollPolicy, SMALL_TALK_REPLY, TIMEOUT_REPLY,
    TurnOrchestrator,
};
use inbox_voice_agent::core::sidechannel::{self, DataSink, PublishError};
use inbox_voice_agent::core::speech::SpeechSink;

#[derive(Default)]
struct RecordingSpeech {
    said: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl SpeechSink for RecordingSpeech {
    async fn say(&self, text: &str, allow_interruptions: bool) {
        self.said
            .lock()
            .unwrap()
            .push((text.to_string(), allow_interruptions));
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl DataSink for RecordingSink {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.sent.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }
}

struct Harness {
    orchestrator: TurnOrchestrator,
    speech: Arc<RecordingSpeech>,
    sink: Arc<RecordingSink>,
    worker: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn new(server: &MockServer) -> Self {
        let backend = Arc::new(
            BackendClient::new(Url::parse(&server.uri()).unwrap())
                .expect("backend client builds"),
        );
        let sink = Arc::new(RecordingSink::default());
        let (handle, worker) = sidechannel::spawn(sink.clone(), "inbox.sources");
        let speech = Arc::new(RecordingSpeech::default());
        let orchestrator = TurnOrchestrator::with_policy(
            backend,
            handle,
            speech.clone(),
            PollPolicy {
                interval: Duration::from_millis(10),
                max_attempts: 5,
            },
        );
        Self {
            orchestrator,
            speech,
            sink,
            worker,
        }
    }

    /// Run one turn, then flush the side-channel worker so published events
    /// are visible to assertions.
    async fn run(self, question: &str) -> (String, Vec<(String, bool)>, Vec<serde_json::Value>) {
        let reply = self.orchestrator.handle_turn(question).await;
        drop(self.orchestrator);
        self.worker.await.unwrap();

        let said = self.speech.said.lock().unwrap().clone();
        let published = self
            .sink
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, payload)| {
                assert_eq!(topic, "inbox.sources");
                serde_json::from_slice(payload).unwrap()
            })
            .collect();
        (reply, said, published)
    }
}

#[tokio::test]
async fn test_immediate_answer_with_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .and(body_json(json!({"question": "how many unread emails do I have"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "You have 3 unread emails.",
            "sources": [{"id": "m1", "subject": "Q3 report"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (reply, said, published) = Harness::new(&server)
        .run("how many unread emails do I have")
        .await;

    assert_eq!(reply, "You have 3 unread emails.");
    assert!(said.is_empty(), "no ack on the immediate path");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["type"], "sources");
    assert_eq!(published[0]["sources"][0]["id"], "m1");
    assert_eq!(published[0]["sources"][0]["subject"], "Q3 report");
}

#[tokio::test]
async fn test_backend_error_body_is_spoken() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "assistant not configured"})),
        )
        .mount(&server)
        .await;

    let (reply, _, published) = Harness::new(&server).run("summarize my inbox").await;

    assert_eq!(
        reply,
        "I couldn't reach the inbox service: assistant not configured"
    );
    assert!(published.is_empty());
}

#[tokio::test]
async fn test_processing_turn_acks_then_polls_to_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing",
            "message": "Working on it.",
            "jobId": "job-1",
        })))
        .mount(&server)
        .await;
    // Two pending polls, then done.
    Mock::given(method("GET"))
        .and(path("/api/assistant/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/assistant/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "answer": "The attachment summary is ready.",
            "sources": [{"id": "m7"}],
        })))
        .mount(&server)
        .await;

    let (reply, said, published) = Harness::new(&server).run("summarize the attachment").await;

    assert_eq!(reply, "The attachment summary is ready.");
    assert_eq!(said, vec![("Working on it.".to_string(), true)]);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["sources"][0]["id"], "m7");
}

#[tokio::test]
async fn test_processing_turn_times_out_at_attempt_cap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing",
            "jobId": "job-2",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/assistant/jobs/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .expect(5)
        .mount(&server)
        .await;

    let (reply, said, _) = Harness::new(&server).run("search every folder").await;

    assert_eq!(reply, TIMEOUT_REPLY);
    // No backend message, so the default ack was spoken.
    assert_eq!(said, vec![(DEFAULT_PROCESSING_ACK.to_string(), true)]);
}

#[tokio::test]
async fn test_processing_without_job_id_fails_cleanly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})),
        )
        .mount(&server)
        .await;

    let (reply, said, _) = Harness::new(&server).run("reindex everything").await;

    assert_eq!(reply, JOB_START_FAILED_REPLY);
    assert_eq!(said.len(), 1, "ack is spoken before the job id check");
}

#[tokio::test]
async fn test_small_talk_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/assistant/ask"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Matching is exact after trim/lowercase; whitespace and case must not
    // defeat the fast path.
    let (reply, said, published) = Harness::new(&server).run("  Hello  ").await;

    assert_eq!(reply, SMALL_TALK_REPLY);
    assert!(said.is_empty());
    assert!(published.is_empty());
}
