//! Typed progress events and the sinks they are written into.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AssessmentError;
use crate::model::TestResult;

/// One unit pushed to the client during a generation run.
///
/// A successful run emits `started`, then `batch_start`/`batch_complete`
/// per batch, then `complete`. A failed run ends with `error` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        total_questions: u32,
        total_batches: u32,
    },
    BatchStart {
        batch: u32,
        total_batches: u32,
        questions_to_generate: u32,
        progress: u32,
    },
    BatchComplete {
        batch: u32,
        total_batches: u32,
        questions_generated: u32,
        total_questions: u32,
        progress: u32,
    },
    Complete {
        test: Box<TestResult>,
        progress: u32,
    },
    Error {
        message: String,
        kind: String,
    },
}

impl ProgressEvent {
    pub fn from_error(err: &AssessmentError) -> Self {
        ProgressEvent::Error {
            message: err.to_string(),
            kind: err.kind().to_string(),
        }
    }

    /// Value of the `type` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Started { .. } => "started",
            ProgressEvent::BatchStart { .. } => "batch_start",
            ProgressEvent::BatchComplete { .. } => "batch_complete",
            ProgressEvent::Complete { .. } => "complete",
            ProgressEvent::Error { .. } => "error",
        }
    }

    /// `complete` and `error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }
}

/// `round(done / total * 100)` in integer arithmetic.
pub fn percent(done: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (done * 200 + total) / (total * 2)
}

/// Receiver of progress events.
///
/// `emit` must not block; the orchestrator awaits nothing between emitting
/// an event and starting the next step.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);

    /// Whether the consumer has gone away. Checked before each batch.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Sink that drops every event.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _: &ProgressEvent) {}
}

/// Sink forwarding events into an unbounded tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver that drains it.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: &ProgressEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!(event = event.kind(), "progress receiver dropped");
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
