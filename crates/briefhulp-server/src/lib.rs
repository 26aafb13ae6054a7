//! Briefhulp HTTP API: application state, error mapping and routes.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
