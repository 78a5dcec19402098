//! API endpoints.

mod admin;
mod analytics;
mod auth;
mod categories;
mod comments;
mod newsletter;
mod posts;
mod profile;
mod search;
mod tags;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// `?page=N` query parameter, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

impl PageQuery {
    #[must_use]
    pub fn page(self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/profile", profile::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/newsletter", newsletter::router())
        .nest("/analytics", analytics::router())
        .nest("/search", search::router())
        .nest("/admin", admin::router())
}
