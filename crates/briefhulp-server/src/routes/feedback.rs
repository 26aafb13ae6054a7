//! Thumbs-up / thumbs-down on an explanation, once per result.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use briefhulp_store::NewFeedback;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::{ApiError, ApiResult, MSG_FEEDBACK_OFF};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/feedback", post(give_feedback))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    /// 1 = useful, 0 = not useful.
    score: i32,
}

/// POST /api/sessions/{id}/feedback
async fn give_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if !matches!(req.score, 0 | 1) {
        return Err(ApiError::bad_request("De score moet 0 of 1 zijn."));
    }
    if !state.feedback.is_enabled() {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, MSG_FEEDBACK_OFF));
    }

    let session = state.sessions.mark_feedback(&id)?;
    let (letter, summary) = session.result()?;
    let record = NewFeedback {
        session_id: session.id.clone(),
        score: req.score,
        summary_text: summary.to_string(),
        original_text: letter.to_string(),
    };

    if let Err(e) = state.feedback.record(&record).await {
        // Allow another attempt, unless a newer result has replaced this one
        if let Err(rollback) = state.sessions.clear_feedback(&id, session.result_id) {
            warn!("Feedback flag of session {} not reset: {}", id, rollback);
        }
        return Err(e.into());
    }

    Ok(Json(json!({
        "recorded": true,
        "message": "Bedankt voor uw feedback!",
    })))
}
