//! Request/response endpoint handlers. Thin wrappers over the core pipeline.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use skillcheck_core::aggregate::aggregate;

use crate::error::ApiError;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(
    answers = body.text_responses.len(),
    test_id = body.test_id.as_deref().unwrap_or("-"),
))]
pub async fn http_evaluate_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EvaluateIn>,
) -> Result<Json<EvaluateOut>, ApiError> {
    if body.text_responses.is_empty() {
        return Err(ApiError::bad_request("text_responses must be a non-empty array"));
    }

    let evaluations = state.evaluator.evaluate_all(&body.text_responses).await?;
    let summary = aggregate(&evaluations);
    info!(
        total = summary.total_text_score,
        max = summary.total_max_score,
        percentage = summary.percentage,
        "text answers evaluated"
    );

    Ok(Json(EvaluateOut {
        success: true,
        user_id: body.user_id,
        test_id: body.test_id,
        summary,
        evaluations,
    }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_generate_skills(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SkillsIn>,
) -> Result<Json<SkillsOut>, ApiError> {
    let skills = state
        .suggester
        .suggest(
            body.specialization.as_deref().unwrap_or_default(),
            body.qualification.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(SkillsOut {
        success: true,
        skills,
    }))
}
