//! Status and LLM configuration routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use briefhulp_chat::providers::test_api_key;
use briefhulp_chat::{LLMConfigUpdate, LLMProvider, TestKeyRequest};
use serde_json::json;
use tracing::{error, info};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/config", get(get_config).put(update_config))
        .route("/config/test", post(test_key))
}

/// GET /api/status: what is available right now.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let resolved = state.assistant.llm_config().read().resolve_provider();
    let store = state.assistant.store().clone();
    let stats = tokio::task::spawn_blocking(move || store.get_stats())
        .await
        .ok()
        .and_then(|r| r.ok());

    Json(json!({
        "llmAvailable": resolved.is_some(),
        "llmProvider": resolved.as_ref().map(|r| r.provider.to_string()),
        "model": resolved.as_ref().map(|r| r.model.clone()),
        "examples": stats.as_ref().map(|s| s.total_documents).unwrap_or(0),
        "examplesPending": stats.as_ref().map(|s| s.pending_documents).unwrap_or(0),
        "embedderAvailable": state.assistant.embedder().is_available(),
        "speechLanguage": state.speech.language(),
        "feedbackSink": state.feedback.kind(),
        "activeSessions": state.sessions.len(),
    }))
}

/// GET /api/config: LLM config with keys masked.
async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.assistant.llm_config().read();
    Json(config.to_response())
}

/// PUT /api/config: merge an update and persist it.
async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> impl IntoResponse {
    let mut config = state.assistant.llm_config().write();
    config.apply_update(&update);
    if let Err(e) = config.save() {
        error!("Failed to save LLM config: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "De instellingen konden niet worden opgeslagen." })),
        );
    }
    info!("LLM config updated (preferred: {})", config.preferred_provider);
    (StatusCode::OK, Json(json!(config.to_response())))
}

/// POST /api/config/test: check an API key against the provider.
async fn test_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestKeyRequest>,
) -> impl IntoResponse {
    let provider: LLMProvider = match req.provider.parse() {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e })),
            )
        }
    };
    let base_url = state
        .assistant
        .llm_config()
        .read()
        .base_url(provider)
        .to_string();

    match test_api_key(state.assistant.client(), provider, &req.api_key, &base_url).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => (StatusCode::OK, Json(json!({ "success": false, "error": e }))),
    }
}
