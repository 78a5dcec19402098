//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quill_common::AppResult;
use quill_core::{RegisterInput, Session};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Ack, ApiResponse},
};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Create an account and log it in.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<Session>> {
    let session = state.account_service.register(input).await?;
    Ok(ApiResponse::created(session))
}

/// Exchange credentials for a token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<Session>> {
    let session = state
        .account_service
        .authenticate(&req.username, &req.password)
        .await?;
    tracing::debug!(user_id = %session.user.id, "User logged in");
    Ok(ApiResponse::ok(session))
}

/// Invalidate the current token.
async fn logout(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Ack<()>>> {
    state.account_service.logout(&actor.user_id).await?;
    Ok(ApiResponse::ok(Ack::new(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
