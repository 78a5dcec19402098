//! Category service.

use std::collections::HashMap;

use quill_common::{AppError, AppResult, IdGenerator, is_valid_slug, slugify};
use quill_db::{
    entities::{category, post},
    repositories::{CategoryRepository, Page, PostFilter, PostOrder, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::policy::{Actor, ensure_can_moderate};

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
    page_size: u64,
}

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Derived from `name` when absent.
    #[validate(length(max = 100))]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: String,
}

/// A category and its number of published posts.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: category::Model,
    pub post_count: i64,
}

/// Resolve the slug for a new category or tag.
///
/// An explicit slug must already be well formed; a derived one must be
/// non-empty.
pub(crate) fn resolve_slug(name: &str, explicit: Option<&str>) -> AppResult<String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(slug) => Err(AppError::Validation(format!("slug: invalid slug '{slug}'"))),
        None => {
            let slug = slugify(name);
            if slug.is_empty() {
                Err(AppError::Validation(
                    "slug: could not derive a slug from the name".to_string(),
                ))
            } else {
                Ok(slug)
            }
        }
    }
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(
        category_repo: CategoryRepository,
        post_repo: PostRepository,
        page_size: u64,
    ) -> Self {
        Self {
            category_repo,
            post_repo,
            id_gen: IdGenerator::new(),
            page_size,
        }
    }

    /// Create a category (admins only).
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateCategoryInput,
    ) -> AppResult<category::Model> {
        ensure_can_moderate(actor)?;
        input.validate()?;

        let name = input.name.trim().to_string();
        let slug = resolve_slug(&name, input.slug.as_deref())?;

        if self.category_repo.exists(&name, &slug).await? {
            return Err(AppError::Conflict(format!(
                "Category '{name}' or slug '{slug}' already exists"
            )));
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            slug: Set(slug),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.category_repo.create(model).await?;
        tracing::info!(category_id = %created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    /// All categories with their published post counts.
    pub async fn list(&self) -> AppResult<Vec<CategoryWithCount>> {
        let categories = self.category_repo.list().await?;
        let counts: HashMap<String, i64> = self
            .category_repo
            .published_post_counts()
            .await?
            .into_iter()
            .map(|c| (c.category_id, c.count))
            .collect();

        Ok(categories
            .into_iter()
            .map(|category| {
                let post_count = counts.get(&category.id).copied().unwrap_or(0);
                CategoryWithCount {
                    category,
                    post_count,
                }
            })
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_slug(slug).await
    }

    /// A category and one page of its published posts, newest first.
    pub async fn posts(
        &self,
        slug: &str,
        page: u64,
    ) -> AppResult<(category::Model, Page<post::Model>)> {
        let category = self.category_repo.get_by_slug(slug).await?;
        let filter = PostFilter {
            category_id: Some(category.id.clone()),
            ..PostFilter::published()
        };
        let posts = self
            .post_repo
            .find_page(&filter, PostOrder::Published, page, self.page_size)
            .await?;
        Ok((category, posts))
    }

    /// Delete a category (admins only). Its posts become uncategorized.
    pub async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        ensure_can_moderate(actor)?;

        let category = self.category_repo.get_by_slug(slug).await?;
        self.category_repo.delete(&category.id).await?;
        tracing::info!(category_id = %category.id, deleted_by = %actor.user_id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quill_db::entities::user_profile::Role;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn create_test_category(id: &str, name: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
            slug: slugify(name),
            description: String::new(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn input(name: &str, slug: Option<&str>) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            slug: slug.map(ToString::to_string),
            description: String::new(),
        }
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug("Web Development", None).unwrap(), "web-development");
        assert_eq!(resolve_slug("Web", Some("web-dev")).unwrap(), "web-dev");
        assert_eq!(resolve_slug("Web", Some("  ")).unwrap(), "web");
        assert!(matches!(resolve_slug("***", None), Err(AppError::Validation(_))));
        assert!(matches!(resolve_slug("Web", Some("Web Dev")), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let service = CategoryService::new(
            CategoryRepository::new(empty_db()),
            PostRepository::new(empty_db()),
            10,
        );
        let author = Actor::new("u1", Role::Author);

        let result = service.create(&author, input("Rust", None)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );
        let service = CategoryService::new(CategoryRepository::new(db), PostRepository::new(empty_db()), 10);
        let admin = Actor::new("admin", Role::Admin);

        let result = service.create(&admin, input("Rust", None)).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_success() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .append_query_results([[create_test_category("c1", "Rust")]])
                .into_connection(),
        );
        let service = CategoryService::new(CategoryRepository::new(db), PostRepository::new(empty_db()), 10);
        let admin = Actor::new("admin", Role::Admin);

        let created = service.create(&admin, input("Rust", None)).await.unwrap();

        assert_eq!(created.slug, "rust");
    }

    #[tokio::test]
    async fn test_list_zero_fills_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_category("c1", "Python"),
                    create_test_category("c2", "Rust"),
                ]])
                .append_query_results([[maplit::btreemap! {
                    "category_id" => Value::String(Some(Box::new("c2".to_string()))),
                    "count" => Value::BigInt(Some(4)),
                }]])
                .into_connection(),
        );
        let service = CategoryService::new(CategoryRepository::new(db), PostRepository::new(empty_db()), 10);

        let list = service.list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].post_count, 0);
        assert_eq!(list[1].post_count, 4);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );
        let service = CategoryService::new(CategoryRepository::new(db), PostRepository::new(empty_db()), 10);
        let admin = Actor::new("admin", Role::Admin);

        let result = service.delete(&admin, "missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_category("c1", "Rust")]])
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
                .into_connection(),
        );
        let service = CategoryService::new(CategoryRepository::new(db), PostRepository::new(empty_db()), 10);
        let admin = Actor::new("admin", Role::Admin);

        assert!(service.delete(&admin, "rust").await.is_ok());
    }
}
