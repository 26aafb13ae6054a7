//! Example corpus routes: stats and search.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use briefhulp_core::RetrievalSettings;
use briefhulp_runtime::retrieve_examples;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_LIMIT: usize = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/examples/stats", get(example_stats))
        .route("/examples/search", get(search_examples))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

/// GET /api/examples/stats
async fn example_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let store = state.assistant.store().clone();
    let stats = tokio::task::spawn_blocking(move || store.get_stats())
        .await
        .map_err(|e| briefhulp_core::Error::Internal(e.to_string()))??;
    Ok(Json(json!({
        "stats": stats,
        "embedderAvailable": state.assistant.embedder().is_available(),
    })))
}

/// GET /api/examples/search?q=&limit=
async fn search_examples(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<serde_json::Value>> {
    if params.q.trim().is_empty() {
        return Err(ApiError::bad_request("Geef een zoekterm op."));
    }
    let settings = RetrievalSettings {
        top_k: params
            .limit
            .unwrap_or(state.config.retrieval.top_k)
            .clamp(1, MAX_LIMIT),
        ..state.config.retrieval.clone()
    };

    let store = state.assistant.store().clone();
    let embedder = state.assistant.embedder().clone();
    let query = params.q.clone();
    let results = tokio::task::spawn_blocking(move || {
        retrieve_examples(&store, embedder.as_ref(), &query, &settings)
    })
    .await
    .map_err(|e| briefhulp_core::Error::Internal(e.to_string()))??;

    Ok(Json(json!({
        "query": params.q,
        "results": results,
        "total": results.len(),
    })))
}
