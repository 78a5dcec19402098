//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use crate::repositories::post::post_ids_by_author;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID, active or not.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment. Replies cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Show or hide a comment.
    pub async fn set_active(&self, comment: comment::Model, active: bool) -> AppResult<comment::Model> {
        let mut model: comment::ActiveModel = comment.into();
        model.active = Set(active);
        model.updated_at = Set(Some(chrono::Utc::now().into()));
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active comments on a post, oldest first.
    pub async fn find_active_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active comments on a post.
    pub async fn count_active_by_post(&self, post_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active comments on all posts, or on one author's posts.
    pub async fn count_active(&self, post_author_id: Option<&str>) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::Active.eq(true))
            .filter(comment::Column::PostId.in_subquery(post_ids_by_author(post_author_id)))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent comments on all posts, or on one author's posts.
    pub async fn find_recent(
        &self,
        post_author_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.in_subquery(post_ids_by_author(post_author_id)))
            .order_by_desc(comment::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_comment(id: &str, parent_id: Option<&str>, active: bool) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: "post1".to_string(),
            author_id: "user1".to_string(),
            content: "Nice post".to_string(),
            active,
            parent_id: parent_id.map(ToString::to_string),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_returns_inactive_comment() {
        let hidden = create_test_comment("c1", None, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[hidden]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let found = repo.get_by_id("c1").await.unwrap();

        assert!(!found.active);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::CommentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_active() {
        let active = create_test_comment("c1", None, true);
        let hidden = create_test_comment("c1", None, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[hidden]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let updated = repo.set_active(active, false).await.unwrap();

        assert!(!updated.active);
    }

    #[tokio::test]
    async fn test_count_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert_eq!(repo.count_active(Some("author1")).await.unwrap(), 7);
    }
}
