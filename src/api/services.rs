use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::error::ApiError;
use super::models::{HealthResponse, PageQuery};
use super::state::AppState;

/// Dispatch plan for one page and login state
///
/// Pages unknown to both registries are 404; a known page whose modules all
/// require login yields an empty plan for anonymous requests.
pub async fn get_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.assignments.knows_page(&page) {
        return Err(ApiError::PageNotFound(page));
    }

    let plan = state.assignments.plan(&page, query.authenticated);
    debug!(
        %page,
        authenticated = query.authenticated,
        handlers = plan.handlers.len(),
        outputs = plan.outputs.len(),
        "Dispatch plan served"
    );

    Ok((StatusCode::OK, Json(plan)))
}

/// Full handler and output tables
pub async fn list_pages(State(state): State<AppState>) -> Response {
    Json(state.assignments.as_ref()).into_response()
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        handler_pages: state.assignments.handlers.len(),
        output_pages: state.assignments.outputs.len(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
