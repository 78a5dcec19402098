//! Category endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use quill_common::AppResult;
use quill_core::{CategoryWithCount, CreateCategoryInput};
use quill_db::{
    entities::{category, post},
    repositories::Page,
};
use serde::Serialize;

use super::PageQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// A category with one page of its published posts.
#[derive(Serialize)]
pub struct CategoryPostsResponse {
    pub category: category::Model,
    pub posts: Page<post::Model>,
}

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<CategoryWithCount>>> {
    Ok(ApiResponse::ok(state.category_service.list().await?))
}

async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.create(&actor, input).await?;
    Ok(ApiResponse::created(category))
}

async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<CategoryPostsResponse>> {
    let (category, posts) = state.category_service.posts(&slug, query.page()).await?;
    Ok(ApiResponse::ok(CategoryPostsResponse { category, posts }))
}

async fn delete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.category_service.delete(&actor, &slug).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{slug}", get(show).delete(delete))
}
