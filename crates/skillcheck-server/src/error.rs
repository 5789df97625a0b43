//! Failure payloads returned by the HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use skillcheck_core::AssessmentError;

/// `{ "success": false, "error", "kind", "question_sn"? }` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_sn: Option<u32>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                success: false,
                error: message.into(),
                kind: "invalid_spec".into(),
                question_sn: None,
            },
        }
    }
}

impl From<AssessmentError> for ApiError {
    fn from(err: AssessmentError) -> Self {
        // per-answer input errors arrive wrapped in `Evaluation`
        let status = match err.kind() {
            "invalid_spec" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(kind = err.kind(), question_sn = ?err.question_sn(), "request failed: {err}");
        }
        Self {
            status,
            body: ErrorBody {
                success: false,
                error: err.to_string(),
                kind: err.kind().to_string(),
                question_sn: err.question_sn(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
