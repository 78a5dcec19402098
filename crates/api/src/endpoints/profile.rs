//! Own-profile endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_core::{ProfileView, UpdateProfileInput};
use quill_db::{entities::post, repositories::Page};
use serde::Serialize;

use super::PageQuery;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Profile with the owner's posts in every status.
#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub posts: Page<post::Model>,
}

async fn show(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.account_service.profile(&actor.user_id).await?;
    let posts = state
        .post_service
        .by_author(&actor.user_id, query.page())
        .await?;
    Ok(ApiResponse::ok(ProfileResponse { profile, posts }))
}

async fn update(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<ProfileView>> {
    let profile = state
        .account_service
        .update_profile(&actor.user_id, input)
        .await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show).put(update))
}
