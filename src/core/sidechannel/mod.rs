//! Best-effort side-channel publisher.
//!
//! Answer sources are supporting context for UI observers, not part of the
//! spoken answer contract. They are handed to a background worker through an
//! unbounded queue: the turn path enqueues and moves on, so a slow or broken
//! data channel can never block or fail a turn. Publish failures are logged
//! at warn and dropped — no retry, nothing surfaces to the caller.
//!
//! Because the enqueue happens before the orchestrator returns its reply and
//! the worker drains in order, observers see sources no later than the spoken
//! answer for the same turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::backend::Source;

/// Failure while emitting a side-channel event.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("data channel send failed: {0}")]
    Transport(String),
}

/// Outbound data-channel transport, implemented over the room in production.
#[async_trait]
pub trait DataSink: Send + Sync {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Wire shape of a sources event: `{"type":"sources","sources":[...]}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "sources")]
pub struct SourcesEvent {
    pub sources: Vec<Source>,
}

/// Handle used by the turn path to dispatch sources without awaiting.
#[derive(Debug, Clone)]
pub struct SidechannelHandle {
    tx: mpsc::UnboundedSender<Vec<Source>>,
}

impl SidechannelHandle {
    /// Enqueue sources for publication. Never blocks, never fails the caller.
    pub fn dispatch(&self, sources: Vec<Source>) {
        if sources.is_empty() {
            return;
        }
        debug!(count = sources.len(), "dispatching sources to side channel");
        if self.tx.send(sources).is_err() {
            warn!("side channel worker stopped, dropping sources");
        }
    }
}

/// Spawn the publisher worker emitting on `topic` through `sink`.
///
/// The returned task ends once every handle is dropped and the queue is
/// drained.
pub fn spawn(sink: Arc<dyn DataSink>, topic: &'static str) -> (SidechannelHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Source>>();

    let worker = tokio::spawn(async move {
        while let Some(sources) = rx.recv().await {
            let event = SourcesEvent { sources };
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "failed to encode sources event");
                    continue;
                }
            };
            if let Err(e) = sink.send(topic, payload).await {
                warn!(error = %e, "failed to publish sources");
            }
        }
    });

    (SidechannelHandle { tx }, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl DataSink for RecordingSink {
        async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(PublishError::Transport("boom".to_string()));
            }
            self.sent.lock().unwrap().push((topic.to_string(), payload));
            Ok(())
        }
    }

    fn source(id: &str) -> Source {
        Source {
            id: Some(id.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_publishes_tagged_event() {
        let sink = Arc::new(RecordingSink::default());
        let (handle, worker) = spawn(sink.clone(), "inbox.sources");

        handle.dispatch(vec![source("m1")]);
        drop(handle);
        worker.await.unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "inbox.sources");
        let event: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(event["type"], "sources");
        assert_eq!(event["sources"][0]["id"], "m1");
    }

    #[tokio::test]
    async fn test_empty_sources_are_not_published() {
        let sink = Arc::new(RecordingSink::default());
        let (handle, worker) = spawn(sink.clone(), "inbox.sources");

        handle.dispatch(Vec::new());
        drop(handle);
        worker.await.unwrap();

        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_stop_worker() {
        let sink = Arc::new(RecordingSink {
            failures_left: AtomicUsize::new(1),
            ..Default::default()
        });
        let (handle, worker) = spawn(sink.clone(), "inbox.sources");

        handle.dispatch(vec![source("m1")]);
        handle.dispatch(vec![source("m2")]);
        drop(handle);
        worker.await.unwrap();

        // First publish failed silently; the second still went out.
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let event: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(event["sources"][0]["id"], "m2");
    }
}
