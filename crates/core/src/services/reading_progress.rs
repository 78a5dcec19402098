//! Reading progress tracking.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::repositories::{PostRepository, ReadingProgressRepository};

/// Reading progress service for business logic.
#[derive(Clone)]
pub struct ReadingProgressService {
    progress_repo: ReadingProgressRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl ReadingProgressService {
    /// Create a new reading progress service.
    #[must_use]
    pub const fn new(progress_repo: ReadingProgressRepository, post_repo: PostRepository) -> Self {
        Self {
            progress_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record how far `user_id` has read a published post, as a percentage.
    pub async fn update(&self, user_id: &str, post_slug: &str, percentage: i64) -> AppResult<i16> {
        let percentage = i16::try_from(percentage)
            .ok()
            .filter(|p| (0..=100).contains(p))
            .ok_or_else(|| {
                AppError::BadRequest(format!("Percentage must be between 0 and 100, got {percentage}"))
            })?;

        let post = self.post_repo.get_by_slug(post_slug).await?;
        if !post.is_published() {
            return Err(AppError::PostNotFound(post_slug.to_string()));
        }

        self.progress_repo
            .upsert(self.id_gen.generate(), &post.id, user_id, percentage)
            .await?;
        Ok(percentage)
    }

    /// Stored percentage for a user on a post, if any.
    pub async fn get(&self, post_id: &str, user_id: &str) -> AppResult<Option<i16>> {
        Ok(self
            .progress_repo
            .find(post_id, user_id)
            .await?
            .map(|p| p.percentage))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::policy::tests::test_post;
    use quill_db::entities::{post::PostStatus, reading_progress};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[tokio::test]
    async fn test_out_of_range_rejected() {
        let service = ReadingProgressService::new(
            ReadingProgressRepository::new(empty_db()),
            PostRepository::new(empty_db()),
        );

        assert!(matches!(service.update("u1", "p", 101).await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.update("u1", "p", -1).await, Err(AppError::BadRequest(_))));
        assert!(matches!(
            service.update("u1", "p", i64::MAX).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_update_upserts() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post("post1", "author1", PostStatus::Published)]])
                .into_connection(),
        );
        let progress_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
                .into_connection(),
        );
        let service = ReadingProgressService::new(
            ReadingProgressRepository::new(progress_db),
            PostRepository::new(post_db),
        );

        assert_eq!(service.update("u1", "hello-world", 100).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_update_on_draft_is_not_found() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post("post1", "author1", PostStatus::Draft)]])
                .into_connection(),
        );
        let service = ReadingProgressService::new(
            ReadingProgressRepository::new(empty_db()),
            PostRepository::new(post_db),
        );

        let result = service.update("stranger", "hello-world", 50).await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_stored_percentage() {
        let progress_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reading_progress::Model {
                    id: "rp1".to_string(),
                    post_id: "post1".to_string(),
                    user_id: "u1".to_string(),
                    percentage: 42,
                    updated_at: chrono::Utc::now().into(),
                }]])
                .into_connection(),
        );
        let service = ReadingProgressService::new(
            ReadingProgressRepository::new(progress_db),
            PostRepository::new(empty_db()),
        );

        assert_eq!(service.get("post1", "u1").await.unwrap(), Some(42));
    }
}
