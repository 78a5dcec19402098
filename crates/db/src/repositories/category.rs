//! Category repository.

use std::sync::Arc;

use crate::entities::{Category, Post, category, post};
use crate::write_error;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Number of published posts in a category.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CategoryPostCount {
    pub category_id: String,
    pub count: i64,
}

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category: {slug}")))
    }

    /// All categories, alphabetically.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a category with this name or slug already exists.
    pub async fn exists(&self, name: &str, slug: &str) -> AppResult<bool> {
        let count = Category::find()
            .filter(
                sea_orm::Condition::any()
                    .add(category::Column::Name.eq(name))
                    .add(category::Column::Slug.eq(slug)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "Category name or slug already exists"))
    }

    /// Delete a category. Its posts keep existing without a category.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Published post counts per category.
    pub async fn published_post_counts(&self) -> AppResult<Vec<CategoryPostCount>> {
        Post::find()
            .select_only()
            .column(post::Column::CategoryId)
            .column_as(post::Column::Id.count(), "count")
            .filter(post::Column::Status.eq(post::PostStatus::Published))
            .filter(post::Column::CategoryId.is_not_null())
            .group_by(post::Column::CategoryId)
            .into_model::<CategoryPostCount>()
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

    fn create_test_category(id: &str, name: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
            slug: quill_common::slugify(name),
            description: String::new(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.get_by_slug("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_category("c1", "Rust"),
                    create_test_category("c2", "Web Development"),
                ]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.list().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].slug, "web-development");
    }

    #[tokio::test]
    async fn test_published_post_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "category_id" => sea_orm::Value::String(Some(Box::new("c1".to_string()))),
                        "count" => sea_orm::Value::BigInt(Some(4)),
                    },
                    maplit::btreemap! {
                        "category_id" => sea_orm::Value::String(Some(Box::new("c2".to_string()))),
                        "count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let counts = repo.published_post_counts().await.unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].count, 4);
    }
}
