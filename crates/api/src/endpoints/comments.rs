//! Comment moderation endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use quill_common::AppResult;
use quill_db::entities::comment;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// A comment by id, including deactivated ones.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<comment::Model>> {
    Ok(ApiResponse::ok(state.comment_service.get(&id).await?))
}

async fn delete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.comment_service.delete(&actor, &id).await?;
    Ok(no_content())
}

async fn deactivate(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.comment_service.deactivate(&actor, &id).await?;
    Ok(ApiResponse::ok(comment))
}

async fn reactivate(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.comment_service.reactivate(&actor, &id).await?;
    Ok(ApiResponse::ok(comment))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(show).delete(delete))
        .route("/{id}/deactivate", post(deactivate))
        .route("/{id}/reactivate", post(reactivate))
}
