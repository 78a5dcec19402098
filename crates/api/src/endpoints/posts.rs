//! Post endpoints, including the per-post comment, reaction and progress
//! actions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use quill_common::AppResult;
use quill_core::{
    AddCommentInput, CreatePostInput, PostDetail, PostListQuery, ReactionResult, UpdatePostInput,
};
use quill_db::{
    entities::{comment, post, post_reaction::ReactionType},
    repositories::Page,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Ack, ApiResponse, no_content},
};

/// Listing filters plus the page number.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub query: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u64>,
}

/// Reaction toggle request.
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub reaction_type: ReactionType,
}

/// Reading progress request.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub percentage: i64,
}

#[derive(Serialize)]
pub struct ProgressAck {
    pub percentage: i16,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Page<post::Model>>> {
    let page = query.page.unwrap_or(1).max(1);
    let filter = PostListQuery {
        query: query.query,
        category: query.category,
        tag: query.tag,
    };
    let posts = state.post_service.list(&filter, page).await?;
    Ok(ApiResponse::ok(posts))
}

async fn featured(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<post::Model>>> {
    Ok(ApiResponse::ok(state.post_service.featured().await?))
}

async fn create(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.create(&actor, input).await?;
    Ok(ApiResponse::created(post))
}

/// Post page. Counts as a view.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<PostDetail>> {
    let detail = state.post_service.view(&slug, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(detail))
}

async fn update(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<post::Model>> {
    let post = state.post_service.update(&actor, &slug, input).await?;
    Ok(ApiResponse::ok(post))
}

async fn delete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&actor, &slug).await?;
    Ok(no_content())
}

async fn add_comment(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.comment_service.add(&actor, &slug, input).await?;
    Ok(ApiResponse::created(comment))
}

async fn react(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<ReactRequest>,
) -> AppResult<ApiResponse<Ack<ReactionResult>>> {
    let result = state
        .reaction_service
        .react(&actor.user_id, &slug, req.reaction_type)
        .await?;
    Ok(ApiResponse::ok(Ack::new(result)))
}

async fn progress(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> AppResult<ApiResponse<Ack<ProgressAck>>> {
    let percentage = state
        .reading_progress_service
        .update(&actor.user_id, &slug, req.percentage)
        .await?;
    Ok(ApiResponse::ok(Ack::new(ProgressAck { percentage })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/featured", get(featured))
        .route("/{slug}", get(show).put(update).delete(delete))
        .route("/{slug}/comments", post(add_comment))
        .route("/{slug}/react", post(react))
        .route("/{slug}/progress", post(progress))
}
