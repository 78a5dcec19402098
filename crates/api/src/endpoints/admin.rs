//! Admin endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::put,
};
use quill_common::AppResult;
use quill_db::entities::user_profile::{self, Role};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// Change a user's role.
async fn set_role(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> AppResult<ApiResponse<user_profile::Model>> {
    let profile = state
        .account_service
        .set_role(&actor, &user_id, req.role)
        .await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}/role", put(set_role))
}
