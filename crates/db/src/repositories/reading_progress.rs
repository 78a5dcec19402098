//! Reading progress repository.

use std::sync::Arc;

use crate::entities::{ReadingProgress, reading_progress};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};

/// Reading progress repository for database operations.
#[derive(Clone)]
pub struct ReadingProgressRepository {
    db: Arc<DatabaseConnection>,
}

impl ReadingProgressRepository {
    /// Create a new reading progress repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stored progress for a user on a post.
    pub async fn find(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<Option<reading_progress::Model>> {
        ReadingProgress::find()
            .filter(reading_progress::Column::PostId.eq(post_id))
            .filter(reading_progress::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record progress, creating the row on first use.
    ///
    /// Single `INSERT ... ON CONFLICT (post_id, user_id) DO UPDATE`.
    pub async fn upsert(
        &self,
        id: String,
        post_id: &str,
        user_id: &str,
        percentage: i16,
    ) -> AppResult<()> {
        let model = reading_progress::ActiveModel {
            id: Set(id),
            post_id: Set(post_id.to_string()),
            user_id: Set(user_id.to_string()),
            percentage: Set(percentage),
            updated_at: Set(chrono::Utc::now().into()),
        };

        ReadingProgress::insert(model)
            .on_conflict(
                OnConflict::columns([
                    reading_progress::Column::PostId,
                    reading_progress::Column::UserId,
                ])
                .update_columns([
                    reading_progress::Column::Percentage,
                    reading_progress::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
