//! Read-only HTTP view of the frozen module assignments
//!
//! - `GET /health` - liveness plus page counts
//! - `GET /pages` - full handler and output tables
//! - `GET /pages/{page}?authenticated=bool` - dispatch plan for one request

mod error;
pub mod models;
pub mod services;
pub mod state;

pub use error::ApiError;

use axum::{Router, routing::get};

use state::AppState;

/// Build the router over shared, immutable assignments
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(services::health))
        .route("/pages", get(services::list_pages))
        .route("/pages/{page}", get(services::get_page))
        .with_state(state)
}
