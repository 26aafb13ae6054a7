//! HTTP route handlers. Everything lives under `/api`.

pub mod chat;
pub mod draft;
pub mod examples;
pub mod feedback;
pub mod letters;
pub mod sessions;
pub mod speech;
pub mod status;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(sessions::routes())
        .merge(letters::routes(state.config.max_upload_bytes))
        .merge(chat::routes())
        .merge(speech::routes())
        .merge(feedback::routes())
        .merge(draft::routes())
        .merge(examples::routes())
}
