//! Post service.
//!
//! Posts move freely between `draft`, `published` and `archived`. The first
//! move into `published` stamps `published_at`; nothing clears it afterwards.
//! The slug is fixed at creation unless the editor supplies a new one.

use quill_common::{AppError, AppResult, IdGenerator, config::BlogConfig};
use quill_db::{
    entities::{
        category,
        post::{self, PostStatus},
        post_reaction::ReactionType,
        tag, user,
    },
    repositories::{
        CategoryRepository, CommentRepository, Page, PostFilter, PostOrder, PostRepository,
        ReactionRepository, ReadingProgressRepository, TagRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::services::category::resolve_slug;
use crate::services::comment::{CommentThread, build_threads};
use crate::services::policy::{Actor, ensure_can_create, ensure_can_modify_post};
use crate::services::reaction::{ReactionTally, tally};

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    comment_repo: CommentRepository,
    reaction_repo: ReactionRepository,
    progress_repo: ReadingProgressRepository,
    id_gen: IdGenerator,
    blog: BlogConfig,
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Derived from the title when absent.
    #[validate(length(max = 200))]
    pub slug: Option<String>,

    #[validate(length(min = 1))]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub excerpt: String,

    #[validate(url)]
    pub featured_image_url: Option<String>,

    pub category_id: Option<String>,

    #[serde(default)]
    pub tag_ids: Vec<String>,

    #[serde(default)]
    pub status: PostStatus,

    #[serde(default)]
    #[validate(length(max = 160))]
    pub meta_description: String,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub meta_keywords: String,

    #[serde(default)]
    pub featured: bool,
}

/// Input for editing a post. Absent fields are left unchanged; for the
/// nullable fields an explicit `null` clears the value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(url)]
    pub featured_image_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,

    pub tag_ids: Option<Vec<String>>,

    pub status: Option<PostStatus>,

    #[validate(length(max = 160))]
    pub meta_description: Option<String>,

    #[validate(length(max = 255))]
    pub meta_keywords: Option<String>,

    pub featured: Option<bool>,
}

/// Tell a missing field (`None`) apart from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filters for the public post listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    /// Case-insensitive match on title, content or excerpt
    pub query: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Tag slug
    pub tag: Option<String>,
}

/// The public face of a post's author. Contact details stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAuthor {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for PostAuthor {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Everything shown on a post's page.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: post::Model,
    pub author: PostAuthor,
    pub category: Option<category::Model>,
    pub tags: Vec<tag::Model>,
    pub comments: Vec<CommentThread>,
    /// Comments in `comments`, replies included
    pub comment_count: u64,
    pub reactions: Vec<ReactionTally>,
    /// The viewer's own reaction, when signed in
    pub user_reaction: Option<ReactionType>,
    /// The viewer's reading progress, when signed in
    pub reading_progress: Option<i16>,
    pub related_posts: Vec<post::Model>,
    /// Estimated minutes to read
    pub reading_time: u32,
}

/// Estimated reading time in whole minutes, never less than one.
#[must_use]
pub fn reading_time(content: &str, words_per_minute: u32) -> u32 {
    let words = content.split_whitespace().count() as f64;
    let minutes = (words / f64::from(words_per_minute.max(1))).round() as u32;
    minutes.max(1)
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
        comment_repo: CommentRepository,
        reaction_repo: ReactionRepository,
        progress_repo: ReadingProgressRepository,
        blog: BlogConfig,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            tag_repo,
            user_repo,
            comment_repo,
            reaction_repo,
            progress_repo,
            id_gen: IdGenerator::new(),
            blog,
        }
    }

    /// Create a post authored by `actor`.
    pub async fn create(&self, actor: &Actor, input: CreatePostInput) -> AppResult<post::Model> {
        ensure_can_create(actor)?;
        input.validate()?;

        let slug = resolve_slug(&input.title, input.slug.as_deref())?;
        self.ensure_slug_free(&slug, None).await?;

        if let Some(category_id) = &input.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        self.ensure_tags_exist(&input.tag_ids).await?;

        let now = chrono::Utc::now().fixed_offset();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(slug),
            author_id: Set(actor.user_id.clone()),
            content: Set(input.content),
            excerpt: Set(input.excerpt),
            featured_image_url: Set(input.featured_image_url),
            category_id: Set(input.category_id),
            status: Set(input.status),
            meta_description: Set(input.meta_description),
            meta_keywords: Set(input.meta_keywords),
            created_at: Set(now),
            updated_at: Set(None),
            published_at: Set(PostStatus::published_at_after(None, input.status, now)),
            view_count: Set(0),
            featured: Set(input.featured),
        };

        let created = self.post_repo.create(model).await?;
        if !input.tag_ids.is_empty() {
            self.tag_repo.set_post_tags(&created.id, &input.tag_ids).await?;
        }

        tracing::info!(
            post_id = %created.id,
            slug = %created.slug,
            author_id = %actor.user_id,
            status = created.status.as_str(),
            "Post created"
        );
        Ok(created)
    }

    /// Edit a post. Only its author or an admin may do so.
    pub async fn update(
        &self,
        actor: &Actor,
        slug: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_slug(slug).await?;
        ensure_can_modify_post(actor, &post)?;
        input.validate()?;

        if let Some(Some(category_id)) = &input.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        if let Some(tag_ids) = &input.tag_ids {
            self.ensure_tags_exist(tag_ids).await?;
        }

        let now = chrono::Utc::now().fixed_offset();
        let was_published = post.published_at.is_some();
        let mut model: post::ActiveModel = post.clone().into();

        if let Some(new_slug) = input.slug {
            let new_slug = resolve_slug(&post.title, Some(new_slug.as_str()))?;
            if new_slug != post.slug {
                self.ensure_slug_free(&new_slug, Some(&post.id)).await?;
                model.slug = Set(new_slug);
            }
        }
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(content) = input.content {
            model.content = Set(content);
        }
        if let Some(excerpt) = input.excerpt {
            model.excerpt = Set(excerpt);
        }
        if let Some(featured_image_url) = input.featured_image_url {
            model.featured_image_url = Set(featured_image_url);
        }
        if let Some(category_id) = input.category_id {
            model.category_id = Set(category_id);
        }
        if let Some(meta_description) = input.meta_description {
            model.meta_description = Set(meta_description);
        }
        if let Some(meta_keywords) = input.meta_keywords {
            model.meta_keywords = Set(meta_keywords);
        }
        if let Some(featured) = input.featured {
            model.featured = Set(featured);
        }
        if let Some(status) = input.status {
            model.status = Set(status);
            model.published_at = Set(PostStatus::published_at_after(post.published_at, status, now));
        }
        model.updated_at = Set(Some(now));

        let updated = self.post_repo.update(model).await?;
        if let Some(tag_ids) = &input.tag_ids {
            self.tag_repo.set_post_tags(&updated.id, tag_ids).await?;
        }

        if !was_published && updated.published_at.is_some() {
            tracing::info!(post_id = %updated.id, slug = %updated.slug, "Post published");
        } else {
            tracing::info!(post_id = %updated.id, updated_by = %actor.user_id, "Post updated");
        }
        Ok(updated)
    }

    /// Delete a post with its comments, reactions, progress and tag links.
    pub async fn delete(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_slug(slug).await?;
        ensure_can_modify_post(actor, &post)?;

        self.post_repo.delete(&post.id).await?;
        tracing::info!(post_id = %post.id, deleted_by = %actor.user_id, "Post deleted");
        Ok(())
    }

    /// Load a post's page and count the view.
    ///
    /// Unpublished posts are reported missing unless the viewer may edit them.
    pub async fn view(&self, slug: &str, viewer: Option<&Actor>) -> AppResult<PostDetail> {
        let mut post = self.post_repo.get_by_slug(slug).await?;
        if !post.is_published() && !viewer.is_some_and(|v| v.can_modify_post(&post)) {
            return Err(AppError::PostNotFound(slug.to_string()));
        }

        self.post_repo.increment_view_count(&post.id).await?;
        post.view_count += 1;

        let author = PostAuthor::from(self.user_repo.get_by_id(&post.author_id).await?);
        let category = match &post.category_id {
            Some(id) => self.category_repo.find_by_id(id).await?,
            None => None,
        };
        let tags = self.tag_repo.find_by_post(&post.id).await?;
        let comments = build_threads(self.comment_repo.find_active_by_post(&post.id).await?);
        let comment_count = comments.iter().map(|t| 1 + t.replies.len() as u64).sum();
        let reactions = tally(&self.reaction_repo.count_by_type(&post.id).await?);

        let (user_reaction, reading_progress) = match viewer {
            Some(viewer) => (
                self.reaction_repo
                    .find_by_post_and_user(&post.id, &viewer.user_id)
                    .await?
                    .map(|r| r.reaction_type),
                self.progress_repo
                    .find(&post.id, &viewer.user_id)
                    .await?
                    .map(|p| p.percentage),
            ),
            None => (None, None),
        };

        let related_posts = self
            .post_repo
            .find_related(&post, self.blog.related_posts)
            .await?;
        let reading_time = reading_time(&post.content, self.blog.words_per_minute);

        Ok(PostDetail {
            post,
            author,
            category,
            tags,
            comments,
            comment_count,
            reactions,
            user_reaction,
            reading_progress,
            related_posts,
            reading_time,
        })
    }

    /// Published posts, newest first.
    pub async fn list(&self, query: &PostListQuery, page: u64) -> AppResult<Page<post::Model>> {
        let filter = PostFilter {
            query: query.query.clone(),
            category_slug: query.category.clone(),
            tag_slug: query.tag.clone(),
            ..PostFilter::published()
        };
        self.post_repo
            .find_page(&filter, PostOrder::Published, page, self.blog.page_size)
            .await
    }

    /// Published posts flagged as featured.
    pub async fn featured(&self) -> AppResult<Vec<post::Model>> {
        let filter = PostFilter {
            featured: Some(true),
            ..PostFilter::published()
        };
        self.post_repo
            .find_list(&filter, PostOrder::Published, self.blog.featured_posts)
            .await
    }

    /// All of an author's posts in any status, newest first.
    pub async fn by_author(&self, author_id: &str, page: u64) -> AppResult<Page<post::Model>> {
        let filter = PostFilter {
            author_id: Some(author_id.to_string()),
            ..PostFilter::default()
        };
        self.post_repo
            .find_page(&filter, PostOrder::Created, page, self.blog.page_size)
            .await
    }

    async fn ensure_slug_free(&self, slug: &str, exclude_id: Option<&str>) -> AppResult<()> {
        if self.post_repo.slug_taken(slug, exclude_id).await? {
            return Err(AppError::Conflict(format!(
                "slug: a post with slug '{slug}' already exists"
            )));
        }
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: &str) -> AppResult<()> {
        if self.category_repo.find_by_id(category_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "category_id: unknown category '{category_id}'"
            )));
        }
        Ok(())
    }

    async fn ensure_tags_exist(&self, tag_ids: &[String]) -> AppResult<()> {
        let found = self.tag_repo.find_by_ids(tag_ids).await?;
        if let Some(missing) = tag_ids.iter().find(|id| !found.iter().any(|t| &t.id == *id)) {
            return Err(AppError::Validation(format!("tag_ids: unknown tag '{missing}'")));
        }
        Ok(())
    }
}
