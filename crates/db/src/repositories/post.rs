//! Post repository.

use std::sync::Arc;

use crate::entities::{Category, Post, PostTag, Tag, User, category, post, post_tag, tag, user};
use crate::repositories::{Page, like_pattern};
use crate::write_error;
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func, Query, SelectStatement},
};

/// Number of posts in a given status.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct StatusCount {
    pub status: post::PostStatus,
    pub count: i64,
}

/// Sort order for post listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    /// Most recently published first.
    #[default]
    Published,
    /// Most recently created first.
    Created,
    /// Most viewed first.
    Views,
}

impl PostOrder {
    fn apply(self, query: Select<Post>) -> Select<Post> {
        match self {
            Self::Published => query
                .order_by_desc(post::Column::PublishedAt)
                .order_by_desc(post::Column::CreatedAt),
            Self::Created => query.order_by_desc(post::Column::CreatedAt),
            Self::Views => query
                .order_by_desc(post::Column::ViewCount)
                .order_by_desc(post::Column::CreatedAt),
        }
    }
}

/// Criteria for post listings. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<post::PostStatus>,
    pub author_id: Option<String>,
    /// Case-insensitive substring of title, content or excerpt
    pub query: Option<String>,
    /// Also match `query` against the author's username
    pub query_matches_author: bool,
    pub category_id: Option<String>,
    pub category_slug: Option<String>,
    pub tag_id: Option<String>,
    pub tag_slug: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTimeWithTimeZone>,
    /// Exclusive upper bound on `created_at`
    pub created_until: Option<DateTimeWithTimeZone>,
    pub featured: Option<bool>,
    pub exclude_id: Option<String>,
}

impl PostFilter {
    /// Published posts only.
    #[must_use]
    pub fn published() -> Self {
        Self {
            status: Some(post::PostStatus::Published),
            ..Self::default()
        }
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(status) = self.status {
            condition = condition.add(post::Column::Status.eq(status));
        }

        if let Some(author_id) = &self.author_id {
            condition = condition.add(post::Column::AuthorId.eq(author_id.as_str()));
        }

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = like_pattern(query);
            let mut any = Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(post::Column::Title))).like(pattern.as_str()))
                .add(
                    Expr::expr(Func::lower(Expr::col(post::Column::Content)))
                        .like(pattern.as_str()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(post::Column::Excerpt)))
                        .like(pattern.as_str()),
                );
            if self.query_matches_author {
                any = any.add(
                    post::Column::AuthorId.in_subquery(
                        Query::select()
                            .column(user::Column::Id)
                            .from(User)
                            .and_where(user::Column::UsernameLower.like(pattern.as_str()))
                            .to_owned(),
                    ),
                );
            }
            condition = condition.add(any);
        }

        if let Some(category_id) = &self.category_id {
            condition = condition.add(post::Column::CategoryId.eq(category_id.as_str()));
        }

        if let Some(slug) = &self.category_slug {
            condition = condition.add(
                post::Column::CategoryId.in_subquery(
                    Query::select()
                        .column(category::Column::Id)
                        .from(Category)
                        .and_where(category::Column::Slug.eq(slug.as_str()))
                        .to_owned(),
                ),
            );
        }

        if let Some(tag_id) = &self.tag_id {
            condition = condition.add(post::Column::Id.in_subquery(
                Query::select()
                    .column(post_tag::Column::PostId)
                    .from(PostTag)
                    .and_where(post_tag::Column::TagId.eq(tag_id.as_str()))
                    .to_owned(),
            ));
        }

        if let Some(slug) = &self.tag_slug {
            condition = condition.add(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(PostTag)
                        .and_where(
                            post_tag::Column::TagId.in_subquery(
                                Query::select()
                                    .column(tag::Column::Id)
                                    .from(Tag)
                                    .and_where(tag::Column::Slug.eq(slug.as_str()))
                                    .to_owned(),
                            ),
                        )
                        .to_owned(),
                ),
            );
        }

        if let Some(from) = self.created_from {
            condition = condition.add(post::Column::CreatedAt.gte(from));
        }

        if let Some(until) = self.created_until {
            condition = condition.add(post::Column::CreatedAt.lt(until));
        }

        if let Some(featured) = self.featured {
            condition = condition.add(post::Column::Featured.eq(featured));
        }

        if let Some(id) = &self.exclude_id {
            condition = condition.add(post::Column::Id.ne(id.as_str()));
        }

        condition
    }
}

/// `SELECT id FROM post [WHERE author_id = ?]`, for scoping related tables.
pub(crate) fn post_ids_by_author(author_id: Option<&str>) -> SelectStatement {
    let mut query = Query::select();
    query.column(post::Column::Id).from(Post);
    if let Some(author_id) = author_id {
        query.and_where(post::Column::AuthorId.eq(author_id));
    }
    query.to_owned()
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find a post by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<post::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))
    }

    /// Whether `slug` is used by any post other than `exclude_id`.
    pub async fn slug_taken(&self, slug: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let mut query = Post::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(post::Column::Id.ne(id));
        }
        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "slug: a post with this slug already exists"))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "slug: a post with this slug already exists"))
    }

    /// Delete a post. Comments, reactions, progress and tag links cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_view_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(post::Column::ViewCount, Expr::col(post::Column::ViewCount).add(1))
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// One page of posts matching `filter`. `page` is 1-based.
    pub async fn find_page(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: u64,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        // The offset is bound as a signed 64-bit value.
        if (page - 1)
            .checked_mul(per_page)
            .is_none_or(|offset| offset > i64::MAX as u64)
        {
            return Err(AppError::BadRequest(format!("Page {page} is out of range")));
        }

        let paginator = order
            .apply(Post::find().filter(filter.condition()))
            .paginate(self.db.as_ref(), per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Up to `limit` posts matching `filter`.
    pub async fn find_list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        order
            .apply(Post::find().filter(filter.condition()))
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published posts sharing `post`'s category, newest first.
    pub async fn find_related(&self, post: &post::Model, limit: u64) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find()
            .filter(post::Column::Status.eq(post::PostStatus::Published))
            .filter(post::Column::Id.ne(post.id.as_str()));

        query = match &post.category_id {
            Some(category_id) => query.filter(post::Column::CategoryId.eq(category_id.as_str())),
            None => query.filter(post::Column::CategoryId.is_null()),
        };

        PostOrder::Published
            .apply(query)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Post counts grouped by status, optionally for one author.
    pub async fn count_by_status(&self, author_id: Option<&str>) -> AppResult<Vec<StatusCount>> {
        let mut query = Post::find()
            .select_only()
            .column(post::Column::Status)
            .column_as(post::Column::Id.count(), "count");

        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        query
            .group_by(post::Column::Status)
            .into_model::<StatusCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of view counts, optionally for one author.
    pub async fn total_views(&self, author_id: Option<&str>) -> AppResult<i64> {
        #[derive(FromQueryResult)]
        struct SumResult {
            total: Option<i64>,
        }

        let mut query = Post::find()
            .select_only()
            .column_as(post::Column::ViewCount.sum(), "total");

        if let Some(author_id) = author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }

        let result = query
            .into_model::<SumResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.total).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: &str, slug: &str, status: post::PostStatus) -> post::Model {
        post::Model {
            id: id.to_string(),
            title: "Test Post".to_string(),
            slug: slug.to_string(),
            author_id: "author1".to_string(),
            content: "Some words".to_string(),
            excerpt: String::new(),
            featured_image_url: None,
            category_id: Some("cat1".to_string()),
            status,
            meta_description: String::new(),
            meta_keywords: String::new(),
            created_at: Utc::now().into(),
            updated_at: None,
            published_at: None,
            view_count: 0,
            featured: false,
        }
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        match repo.get_by_slug("missing").await {
            Err(AppError::PostNotFound(slug)) => assert_eq!(slug, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_slug_taken_excluding_self() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(!repo.slug_taken("test-post", Some("post1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.increment_view_count("post1").await.is_ok());
    }

    #[tokio::test]
    async fn test_find_page() {
        let p1 = create_test_post("p1", "first", post::PostStatus::Published);
        let p2 = create_test_post("p2", "second", post::PostStatus::Published);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let filter = PostFilter {
            query: Some("rust".to_string()),
            tag_slug: Some("async".to_string()),
            ..PostFilter::published()
        };
        let page = repo.find_page(&filter, PostOrder::Published, 2, 10).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_find_page_rejects_overflowing_page() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let result = repo
            .find_page(&PostFilter::published(), PostOrder::Published, u64::MAX, 10)
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_find_page_rejects_offset_past_i64() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let page = (i64::MAX as u64) / 10 + 2;
        let result = repo
            .find_page(&PostFilter::published(), PostOrder::Published, page, 10)
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "status" => sea_orm::Value::String(Some(Box::new("draft".to_string()))),
                        "count" => sea_orm::Value::BigInt(Some(2)),
                    },
                    maplit::btreemap! {
                        "status" => sea_orm::Value::String(Some(Box::new("published".to_string()))),
                        "count" => sea_orm::Value::BigInt(Some(5)),
                    },
                ]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let counts = repo.count_by_status(Some("author1")).await.unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[1].status, post::PostStatus::Published);
        assert_eq!(counts[1].count, 5);
    }

    #[tokio::test]
    async fn test_total_views_defaults_to_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "total" => sea_orm::Value::BigInt(None)
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.total_views(None).await.unwrap(), 0);
    }
}
