//! Tag repository.

use std::sync::Arc;

use crate::entities::{PostTag, Tag, post_tag, tag};
use crate::write_error;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Query,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<tag::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag: {slug}")))
    }

    /// Find tags by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<tag::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Tag::find()
            .filter(tag::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All tags, alphabetically.
    pub async fn list(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a tag with this name or slug already exists.
    pub async fn exists(&self, name: &str, slug: &str) -> AppResult<bool> {
        let count = Tag::find()
            .filter(
                Condition::any()
                    .add(tag::Column::Name.eq(name))
                    .add(tag::Column::Slug.eq(slug)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new tag.
    pub async fn create(&self, model: tag::ActiveModel) -> AppResult<tag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "Tag name or slug already exists"))
    }

    /// Tags attached to a post.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .filter(
                tag::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::TagId)
                        .from(PostTag)
                        .and_where(post_tag::Column::PostId.eq(post_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the set of tags attached to a post.
    pub async fn set_post_tags(&self, post_id: &str, tag_ids: &[String]) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostTag::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !tag_ids.is_empty() {
            let links = tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
                post_id: Set(post_id.to_string()),
                tag_id: Set(tag_id.clone()),
            });
            PostTag::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
