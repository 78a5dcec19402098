//! Post reaction repository.
//!
//! The toggle is expressed as conditional writes so that concurrent requests
//! for the same (post, user) pair never leave more than one row behind.

use std::sync::Arc;

use crate::entities::{PostReaction, post_reaction};
use crate::repositories::post::post_ids_by_author;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect, Set, sea_query::{Expr, OnConflict},
};

/// Number of reactions of one type on a post.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ReactionCount {
    pub reaction_type: post_reaction::ReactionType,
    pub count: i64,
}

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The user's reaction on a post, if any.
    pub async fn find_by_post_and_user(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<Option<post_reaction::Model>> {
        PostReaction::find()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the user's reaction only if it has the given type.
    ///
    /// Returns the number of rows removed (0 or 1).
    pub async fn delete_matching(
        &self,
        post_id: &str,
        user_id: &str,
        reaction_type: post_reaction::ReactionType,
    ) -> AppResult<u64> {
        let result = PostReaction::delete_many()
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .filter(post_reaction::Column::ReactionType.eq(reaction_type))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Overwrite the type of an existing reaction.
    ///
    /// Returns the number of rows changed (0 or 1).
    pub async fn switch_type(
        &self,
        post_id: &str,
        user_id: &str,
        reaction_type: post_reaction::ReactionType,
    ) -> AppResult<u64> {
        let result = PostReaction::update_many()
            .col_expr(post_reaction::Column::ReactionType, Expr::value(reaction_type))
            .col_expr(
                post_reaction::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(post_reaction::Column::PostId.eq(post_id))
            .filter(post_reaction::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Insert a reaction, or overwrite the type if a concurrent request got
    /// there first.
    pub async fn upsert(&self, model: post_reaction::ActiveModel) -> AppResult<()> {
        PostReaction::insert(model)
            .on_conflict(
                OnConflict::columns([
                    post_reaction::Column::PostId,
                    post_reaction::Column::UserId,
                ])
                .update_columns([
                    post_reaction::Column::ReactionType,
                    post_reaction::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Reaction counts per type on a post.
    pub async fn count_by_type(&self, post_id: &str) -> AppResult<Vec<ReactionCount>> {
        PostReaction::find()
            .select_only()
            .column(post_reaction::Column::ReactionType)
            .column_as(post_reaction::Column::Id.count(), "count")
            .filter(post_reaction::Column::PostId.eq(post_id))
            .group_by(post_reaction::Column::ReactionType)
            .into_model::<ReactionCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reactions on all posts, or on one author's posts.
    pub async fn count(&self, post_author_id: Option<&str>) -> AppResult<u64> {
        PostReaction::find()
            .filter(post_reaction::Column::PostId.in_subquery(post_ids_by_author(post_author_id)))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Build a new reaction row.
#[must_use]
pub fn new_reaction(
    id: String,
    post_id: &str,
    user_id: &str,
    reaction_type: post_reaction::ReactionType,
) -> post_reaction::ActiveModel {
    let now = chrono::Utc::now().fixed_offset();
    post_reaction::ActiveModel {
        id: Set(id),
        post_id: Set(post_id.to_string()),
        user_id: Set(user_id.to_string()),
        reaction_type: Set(reaction_type),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    }
}
