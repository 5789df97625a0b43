//! Pipeline error taxonomy.
//!
//! Every failure of the generation loop or the evaluator is one of these
//! variants. The `kind()` string is what clients see in `error` progress
//! events and failure payloads, so it must stay stable.

use thiserror::Error;

/// Number of characters of offending model output kept for diagnostics.
pub const EXCERPT_CHARS: usize = 200;

/// Errors produced by the generation and evaluation pipeline.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// A required input field is missing or names an unknown value.
    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    /// The generation capability failed or exceeded its deadline.
    #[error("generation backend failed: {0}")]
    Transport(String),

    /// Sanitized model output is not valid JSON.
    #[error("malformed model response: {message} (excerpt: {excerpt:?})")]
    MalformedResponse { message: String, excerpt: String },

    /// Model output parsed, but does not have the required shape.
    #[error("model response violates schema: {0}")]
    SchemaViolation(String),

    /// The progress consumer went away before the run finished.
    #[error("run cancelled: progress consumer disconnected")]
    Cancelled,

    /// Evaluation of a single answer failed.
    #[error("evaluation of question {question_sn} failed: {source}")]
    Evaluation {
        question_sn: u32,
        #[source]
        source: Box<AssessmentError>,
    },
}

impl AssessmentError {
    /// Stable machine-readable error class.
    pub fn kind(&self) -> &'static str {
        match self {
            AssessmentError::InvalidSpec(_) => "invalid_spec",
            AssessmentError::Transport(_) => "transport_failure",
            AssessmentError::MalformedResponse { .. } => "malformed_response",
            AssessmentError::SchemaViolation(_) => "schema_violation",
            AssessmentError::Cancelled => "cancelled",
            AssessmentError::Evaluation { source, .. } => source.kind(),
        }
    }

    /// Question the failure belongs to, for per-answer evaluation errors.
    pub fn question_sn(&self) -> Option<u32> {
        match self {
            AssessmentError::Evaluation { question_sn, .. } => Some(*question_sn),
            _ => None,
        }
    }

    /// Build a `MalformedResponse`, keeping a bounded excerpt of `text`.
    pub fn malformed(message: impl Into<String>, text: &str) -> Self {
        AssessmentError::MalformedResponse {
            message: message.into(),
            excerpt: excerpt(text),
        }
    }

    /// Wrap a provider error, keeping the full context chain.
    pub fn transport(err: &anyhow::Error) -> Self {
        AssessmentError::Transport(format!("{err:#}"))
    }
}

/// First `EXCERPT_CHARS` characters of `text`, never splitting a char.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}
