//! Reply-letter drafting.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use briefhulp_chat::letter::{FIELD_HELP, WRITING_TIPS};
use briefhulp_chat::{DraftPrefill, DraftRequest, LetterKind, Tone};
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/draft/options", get(draft_options))
        .route("/draft", post(draft_letter))
        .route("/sessions/{id}/draft/prefill", get(draft_prefill))
}

/// GET /api/draft/options: letter kinds, tones and help texts for the form.
async fn draft_options() -> Json<serde_json::Value> {
    let kinds: Vec<&str> = LetterKind::ALL.iter().map(|k| k.label()).collect();
    let tones: Vec<serde_json::Value> = Tone::ALL
        .iter()
        .map(|t| json!({ "label": t.label(), "help": t.help() }))
        .collect();

    Json(json!({
        "kinds": kinds,
        "tones": tones,
        "defaultTone": Tone::default().label(),
        "fieldHelp": FIELD_HELP,
        "tips": WRITING_TIPS,
    }))
}

/// GET /api/sessions/{id}/draft/prefill: form values from the explained letter.
async fn draft_prefill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state.sessions.get(&id)?;
    let prefill = DraftPrefill::from_analysis(&session.analysis);
    Ok(Json(json!({
        "suggested": prefill.kind.is_some(),
        "action": session.analysis.action,
        "prefill": prefill,
    })))
}

/// POST /api/draft
async fn draft_letter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DraftRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let kind = req.kind;
    let letter = state.assistant.draft(req).await?;
    Ok(Json(json!({
        "kind": kind,
        "letter": letter,
    })))
}
