//! Letter routes: explain pasted or uploaded letters, consequences, translation.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use briefhulp_chat::{DraftPrefill, ParsedExplanation};
use briefhulp_ingest::FileKind;
use briefhulp_runtime::Explanation;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, MSG_NOT_AGREED, MSG_NO_TEXT, MSG_UNSUPPORTED_FILE};
use crate::state::AppState;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/{id}/letter", post(explain_text))
        .route(
            "/sessions/{id}/letter/upload",
            post(explain_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/sessions/{id}/consequences", get(consequences))
        .route("/sessions/{id}/translate", post(translate))
}

#[derive(Debug, Deserialize)]
struct LetterRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    agreed: bool,
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    language: String,
}

/// POST /api/sessions/{id}/letter: explain pasted text.
async fn explain_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LetterRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.sessions.get(&id)?;
    if !req.agreed {
        return Err(ApiError::bad_request(MSG_NOT_AGREED));
    }
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request(MSG_NO_TEXT));
    }
    explain_and_record(&state, &id, req.text.trim().to_string()).await
}

/// POST /api/sessions/{id}/letter/upload: multipart `file` plus `agreed`.
async fn explain_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    state.sessions.get(&id)?;

    let mut agreed = false;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(MSG_NO_TEXT).with_detail(e.to_string()))?
    {
        match field.name() {
            Some("agreed") => {
                let value = field.text().await.unwrap_or_default();
                agreed = matches!(value.trim(), "true" | "1" | "on" | "yes");
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(MSG_NO_TEXT).with_detail(e.to_string()))?;
                upload = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if !agreed {
        return Err(ApiError::bad_request(MSG_NOT_AGREED));
    }
    let Some((name, bytes)) = upload.filter(|(_, b)| !b.is_empty()) else {
        return Err(ApiError::bad_request(MSG_NO_TEXT));
    };
    if FileKind::from_name(&name) == FileKind::Unsupported {
        return Err(ApiError::bad_request(MSG_UNSUPPORTED_FILE));
    }

    debug!("Upload {} ({} bytes) for session {}", name, bytes.len(), id);
    let text = state
        .assistant
        .extractor()
        .extract_bytes(&name, &bytes)
        .await?;
    explain_and_record(&state, &id, text).await
}

async fn explain_and_record(
    state: &AppState,
    id: &str,
    letter: String,
) -> ApiResult<Json<serde_json::Value>> {
    let Explanation {
        summary,
        analysis,
        examples,
    } = state.assistant.explain(&letter).await?;

    let session = state.sessions.record_result(
        id,
        letter,
        ParsedExplanation {
            summary: summary.clone(),
            analysis: analysis.clone(),
        },
    )?;
    info!("Session {}: letter explained", id);

    Ok(Json(json!({
        "summary": summary,
        "analysis": analysis,
        "draftPrefill": DraftPrefill::from_analysis(&analysis),
        "examples": examples,
        "transcript": session.transcript,
    })))
}

/// GET /api/sessions/{id}/consequences: computed once per result.
async fn consequences(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state.sessions.get(&id)?;
    if let Some(text) = &session.consequences {
        return Ok(Json(json!({ "consequences": text, "cached": true })));
    }

    let (letter, _) = session.result()?;
    let text = state.assistant.consequences(letter).await?;
    state
        .sessions
        .set_consequences(&id, session.result_id, text.clone())?;
    Ok(Json(json!({ "consequences": text, "cached": false })))
}

/// POST /api/sessions/{id}/translate: the explanation in another language.
async fn translate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TranslateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state.sessions.get(&id)?;
    let (_, summary) = session.result()?;
    let translation = state.assistant.translate(summary, &req.language).await?;
    Ok(Json(json!({
        "language": req.language.trim(),
        "translation": translation,
    })))
}
