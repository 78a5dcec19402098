//! Tag endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_core::CreateTagInput;
use quill_db::{
    entities::{post, tag},
    repositories::Page,
};
use serde::Serialize;

use super::PageQuery;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

#[derive(Serialize)]
pub struct TagPostsResponse {
    pub tag: tag::Model,
    pub posts: Page<post::Model>,
}

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    Ok(ApiResponse::ok(state.tag_service.list().await?))
}

async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTagInput>,
) -> AppResult<ApiResponse<tag::Model>> {
    let tag = state.tag_service.create(&actor, input).await?;
    Ok(ApiResponse::created(tag))
}

async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<TagPostsResponse>> {
    let (tag, posts) = state.tag_service.posts(&slug, query.page()).await?;
    Ok(ApiResponse::ok(TagPostsResponse { tag, posts }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{slug}", get(show))
}
