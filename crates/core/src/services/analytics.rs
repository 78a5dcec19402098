//! Author and admin dashboard.

use quill_common::AppResult;
use quill_db::{
    entities::{comment, post},
    repositories::{
        CommentRepository, NewsletterRepository, PostFilter, PostOrder, PostRepository,
        ReactionRepository, StatusCount,
    },
};
use serde::Serialize;

use crate::services::policy::{Actor, ensure_can_create};

const RECENT_COMMENTS: u64 = 5;

/// Analytics service for business logic.
#[derive(Clone)]
pub struct AnalyticsService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    reaction_repo: ReactionRepository,
    newsletter_repo: NewsletterRepository,
    top_posts: u64,
}

/// Figures for the dashboard, scoped to the actor's posts (or all posts for
/// admins).
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total_posts: i64,
    pub draft_posts: i64,
    pub published_posts: i64,
    pub archived_posts: i64,
    pub total_views: i64,
    pub total_comments: u64,
    pub total_reactions: u64,
    pub top_posts: Vec<post::Model>,
    pub recent_comments: Vec<comment::Model>,
    /// Only reported to admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter_subscribers: Option<u64>,
}

fn count_for(counts: &[StatusCount], status: post::PostStatus) -> i64 {
    counts
        .iter()
        .filter(|c| c.status == status)
        .map(|c| c.count)
        .sum()
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        reaction_repo: ReactionRepository,
        newsletter_repo: NewsletterRepository,
        top_posts: u64,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            reaction_repo,
            newsletter_repo,
            top_posts,
        }
    }

    pub async fn dashboard(&self, actor: &Actor) -> AppResult<Dashboard> {
        ensure_can_create(actor)?;

        let scope = if actor.can_moderate() {
            None
        } else {
            Some(actor.user_id.as_str())
        };

        let counts = self.post_repo.count_by_status(scope).await?;
        let total_views = self.post_repo.total_views(scope).await?;
        let total_comments = self.comment_repo.count_active(scope).await?;
        let total_reactions = self.reaction_repo.count(scope).await?;

        let filter = PostFilter {
            author_id: scope.map(ToString::to_string),
            ..PostFilter::default()
        };
        let top_posts = self
            .post_repo
            .find_list(&filter, PostOrder::Views, self.top_posts)
            .await?;
        let recent_comments = self.comment_repo.find_recent(scope, RECENT_COMMENTS).await?;

        let newsletter_subscribers = if actor.can_moderate() {
            Some(self.newsletter_repo.count_active().await?)
        } else {
            None
        };

        Ok(Dashboard {
            total_posts: counts.iter().map(|c| c.count).sum(),
            draft_posts: count_for(&counts, post::PostStatus::Draft),
            published_posts: count_for(&counts, post::PostStatus::Published),
            archived_posts: count_for(&counts, post::PostStatus::Archived),
            total_views,
            total_comments,
            total_reactions,
            top_posts,
            recent_comments,
            newsletter_subscribers,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::policy::tests::{test_comment, test_post};
    use quill_common::AppError;
    use quill_db::entities::user_profile::Role;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn conn(db: MockDatabase) -> Arc<DatabaseConnection> {
        Arc::new(db.into_connection())
    }

    fn mock() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn num_items(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn post_db() -> MockDatabase {
        mock()
            .append_query_results([[
                maplit::btreemap! {
                    "status" => Value::String(Some(Box::new("draft".to_string()))),
                    "count" => Value::BigInt(Some(1)),
                },
                maplit::btreemap! {
                    "status" => Value::String(Some(Box::new("published".to_string()))),
                    "count" => Value::BigInt(Some(3)),
                },
            ]])
            .append_query_results([[maplit::btreemap! {
                "total" => Value::BigInt(Some(120)),
            }]])
            .append_query_results([[test_post("p1", "author1", post::PostStatus::Published)]])
    }

    #[tokio::test]
    async fn test_reader_has_no_dashboard() {
        let service = AnalyticsService::new(
            PostRepository::new(conn(mock())),
            CommentRepository::new(conn(mock())),
            ReactionRepository::new(conn(mock())),
            NewsletterRepository::new(conn(mock())),
            5,
        );

        let result = service.dashboard(&Actor::new("u1", Role::Reader)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_author_dashboard_hides_subscribers() {
        let service = AnalyticsService::new(
            PostRepository::new(conn(post_db())),
            CommentRepository::new(conn(
                mock()
                    .append_query_results([[num_items(7)]])
                    .append_query_results([[test_comment("c1", "u2", None)]]),
            )),
            ReactionRepository::new(conn(mock().append_query_results([[num_items(4)]]))),
            NewsletterRepository::new(conn(mock())),
            5,
        );

        let dashboard = service
            .dashboard(&Actor::new("author1", Role::Author))
            .await
            .unwrap();

        assert_eq!(dashboard.total_posts, 4);
        assert_eq!(dashboard.draft_posts, 1);
        assert_eq!(dashboard.published_posts, 3);
        assert_eq!(dashboard.archived_posts, 0);
        assert_eq!(dashboard.total_views, 120);
        assert_eq!(dashboard.total_comments, 7);
        assert_eq!(dashboard.total_reactions, 4);
        assert_eq!(dashboard.top_posts.len(), 1);
        assert_eq!(dashboard.recent_comments.len(), 1);
        assert_eq!(dashboard.newsletter_subscribers, None);
    }

    #[tokio::test]
    async fn test_admin_dashboard_includes_subscribers() {
        let service = AnalyticsService::new(
            PostRepository::new(conn(post_db())),
            CommentRepository::new(conn(
                mock()
                    .append_query_results([[num_items(0)]])
                    .append_query_results([Vec::<comment::Model>::new()]),
            )),
            ReactionRepository::new(conn(mock().append_query_results([[num_items(0)]]))),
            NewsletterRepository::new(conn(mock().append_query_results([[num_items(12)]]))),
            5,
        );

        let dashboard = service
            .dashboard(&Actor::new("admin", Role::Admin))
            .await
            .unwrap();

        assert_eq!(dashboard.newsletter_subscribers, Some(12));
    }
}
