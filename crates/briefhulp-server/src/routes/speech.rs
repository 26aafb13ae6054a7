//! Reading the explanation aloud.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/audio", get(explanation_audio))
}

/// GET /api/sessions/{id}/audio: MP3 of the current explanation.
async fn explanation_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session = state.sessions.get(&id)?;
    let (_, summary) = session.result()?;
    let audio = state.speech.synthesize(summary).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        audio,
    ))
}
