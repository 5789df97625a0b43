//! Router assembly: HTTP endpoints, the progress stream, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod stream;

/// Build the application router with:
/// - `GET  /api/health`
/// - `POST /api/ai/generate-test` (server-sent progress events)
/// - `POST /api/ai/evaluate-text`
/// - `POST /api/ai/generate-skills`
/// - permissive CORS and per-request trace spans
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/ai/generate-test", post(stream::http_generate_test))
        .route("/api/ai/evaluate-text", post(http::http_evaluate_text))
        .route("/api/ai/generate-skills", post(http::http_generate_skills))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
