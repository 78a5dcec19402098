//! Tag service.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::{post, tag},
    repositories::{Page, PostFilter, PostOrder, PostRepository, TagRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::category::resolve_slug;
use crate::services::policy::{Actor, ensure_can_create};

/// Tag service for business logic.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
    page_size: u64,
}

/// Input for creating a tag.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagInput {
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(max = 50))]
    pub slug: Option<String>,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository, post_repo: PostRepository, page_size: u64) -> Self {
        Self {
            tag_repo,
            post_repo,
            id_gen: IdGenerator::new(),
            page_size,
        }
    }

    /// Create a tag. Authors and admins only.
    pub async fn create(&self, actor: &Actor, input: CreateTagInput) -> AppResult<tag::Model> {
        ensure_can_create(actor)?;
        input.validate()?;

        let name = input.name.trim().to_string();
        let slug = resolve_slug(&name, input.slug.as_deref())?;

        if self.tag_repo.exists(&name, &slug).await? {
            return Err(AppError::Conflict(format!(
                "Tag '{name}' or slug '{slug}' already exists"
            )));
        }

        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            slug: Set(slug),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.tag_repo.create(model).await?;
        tracing::info!(tag_id = %created.id, slug = %created.slug, "Tag created");
        Ok(created)
    }

    pub async fn list(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.list().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<tag::Model> {
        self.tag_repo.get_by_slug(slug).await
    }

    /// A tag and one page of its published posts, newest first.
    pub async fn posts(&self, slug: &str, page: u64) -> AppResult<(tag::Model, Page<post::Model>)> {
        let tag = self.tag_repo.get_by_slug(slug).await?;
        let filter = PostFilter {
            tag_id: Some(tag.id.clone()),
            ..PostFilter::published()
        };
        let posts = self
            .post_repo
            .find_page(&filter, PostOrder::Published, page, self.page_size)
            .await?;
        Ok((tag, posts))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quill_db::entities::user_profile::Role;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn create_test_tag(id: &str, name: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            slug: quill_common::slugify(name),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_reader_cannot_create_tag() {
        let service = TagService::new(TagRepository::new(empty_db()), PostRepository::new(empty_db()), 10);
        let reader = Actor::new("u1", Role::Reader);
        let input = CreateTagInput {
            name: "async".to_string(),
            slug: None,
        };

        let result = service.create(&reader, input).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_author_creates_tag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .append_query_results([[create_test_tag("t1", "Async IO")]])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(db), PostRepository::new(empty_db()), 10);
        let author = Actor::new("u1", Role::Author);
        let input = CreateTagInput {
            name: "Async IO".to_string(),
            slug: None,
        };

        let created = service.create(&author, input).await.unwrap();

        assert_eq!(created.slug, "async-io");
    }

    #[tokio::test]
    async fn test_posts_for_tag() {
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tag("t1", "rust")]])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(tag_db), PostRepository::new(post_db), 10);

        let (tag, posts) = service.posts("rust", 1).await.unwrap();

        assert_eq!(tag.id, "t1");
        assert_eq!(posts.total, 0);
        assert!(posts.items.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .into_connection(),
        );
        let service = TagService::new(TagRepository::new(db), PostRepository::new(empty_db()), 10);

        assert!(matches!(service.get_by_slug("nope").await, Err(AppError::NotFound(_))));
    }
}
