//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use quill_common::config::BlogConfig;
use quill_core::{
    AccountService, AnalyticsService, CategoryService, CommentService, NewsletterService,
    PostService, ReactionService, ReadingProgressService, SearchService, TagService,
};
use quill_db::repositories::{
    CategoryRepository, CommentRepository, NewsletterRepository, PostRepository,
    ReactionRepository, ReadingProgressRepository, TagRepository, UserProfileRepository,
    UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub reading_progress_service: ReadingProgressService,
    pub category_service: CategoryService,
    pub tag_service: TagService,
    pub newsletter_service: NewsletterService,
    pub analytics_service: AnalyticsService,
    pub search_service: SearchService,
}

impl AppState {
    /// Wire every service to one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, blog: &BlogConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = UserProfileRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));
        let tag_repo = TagRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let reaction_repo = ReactionRepository::new(Arc::clone(&db));
        let progress_repo = ReadingProgressRepository::new(Arc::clone(&db));
        let newsletter_repo = NewsletterRepository::new(db);

        Self {
            account_service: AccountService::new(user_repo.clone(), profile_repo),
            post_service: PostService::new(
                post_repo.clone(),
                category_repo.clone(),
                tag_repo.clone(),
                user_repo,
                comment_repo.clone(),
                reaction_repo.clone(),
                progress_repo.clone(),
                blog.clone(),
            ),
            comment_service: CommentService::new(comment_repo.clone(), post_repo.clone()),
            reaction_service: ReactionService::new(reaction_repo.clone(), post_repo.clone()),
            reading_progress_service: ReadingProgressService::new(progress_repo, post_repo.clone()),
            category_service: CategoryService::new(category_repo, post_repo.clone(), blog.page_size),
            tag_service: TagService::new(tag_repo, post_repo.clone(), blog.page_size),
            newsletter_service: NewsletterService::new(newsletter_repo.clone()),
            analytics_service: AnalyticsService::new(
                post_repo.clone(),
                comment_repo,
                reaction_repo,
                newsletter_repo,
                blog.top_posts,
            ),
            search_service: SearchService::new(post_repo, blog.page_size),
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` into an [`quill_core::Actor`]
/// request extension. Unknown tokens are ignored here; endpoints that need a
/// user reject the request through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string);

    if let Some(token) = token {
        match state.account_service.authenticate_by_token(&token).await {
            Ok((_, actor)) => {
                req.extensions_mut().insert(actor);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
