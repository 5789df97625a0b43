//! Server-sent progress stream for test generation.
//!
//! The orchestrator runs on its own task and writes into a channel; the
//! response body drains that channel. Dropping the response (client gone)
//! closes the channel, which the orchestrator notices before its next batch.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream;
use tracing::{info, instrument, warn};

use skillcheck_core::model::TestRequest;
use skillcheck_core::progress::{ChannelSink, ProgressEvent};

use crate::error::ApiError;
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[instrument(level = "info", skip(state, body), fields(
    skill = body.skill.as_deref().unwrap_or("-"),
    level = body.level.as_deref().unwrap_or("-"),
))]
pub async fn http_generate_test(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Rejected before any streaming starts.
    let spec = body.validate()?;

    let (sink, rx) = ChannelSink::pair();
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        match orchestrator.run(spec, &sink).await {
            Ok(test) => info!(test_id = %test.test_id, "generation stream finished"),
            Err(failure) => warn!(
                kind = failure.error.kind(),
                completed_batches = failure.checkpoint.completed_batches(),
                "generation stream ended with error"
            ),
        }
        // dropping the sink ends the response stream
    });

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((to_sse(&event), rx))
    });

    let headers = [
        (header::CACHE_CONTROL, "no-cache"),
        (X_ACCEL_BUFFERING, "no"),
    ];
    Ok((headers, Sse::new(events).keep_alive(KeepAlive::default())))
}

fn to_sse(event: &ProgressEvent) -> Result<Event, axum::Error> {
    Event::default().json_data(event)
}
