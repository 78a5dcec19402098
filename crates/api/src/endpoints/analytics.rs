//! Analytics endpoint.

use axum::{Router, extract::State, routing::get};
use quill_common::AppResult;
use quill_core::Dashboard;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

async fn dashboard(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Dashboard>> {
    Ok(ApiResponse::ok(state.analytics_service.dashboard(&actor).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}
