//! Comment service.
//!
//! Comments form a tree through `parent_id`, but listings are one level deep:
//! each top-level comment carries its direct replies. Only active comments
//! are listed; deactivated ones stay addressable by id.

use std::collections::HashMap;

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::policy::{Actor, ensure_can_delete_comment, ensure_can_moderate};

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for adding a comment or reply.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentInput {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,

    /// Comment being replied to
    pub parent_id: Option<String>,
}

/// A top-level comment with its direct replies, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    pub comment: comment::Model,
    pub replies: Vec<comment::Model>,
}

/// Group active comments (already ordered oldest first) into threads.
///
/// Replies whose parent is not itself a listed top-level comment are dropped.
#[must_use]
pub fn build_threads(comments: Vec<comment::Model>) -> Vec<CommentThread> {
    let (top_level, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<String, Vec<comment::Model>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id.clone() {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Active comments on a post, threaded.
    pub async fn thread(&self, post_id: &str) -> AppResult<Vec<CommentThread>> {
        let comments = self.comment_repo.find_active_by_post(post_id).await?;
        Ok(build_threads(comments))
    }

    /// A comment by id, whether active or not.
    pub async fn get(&self, id: &str) -> AppResult<comment::Model> {
        self.comment_repo.get_by_id(id).await
    }

    /// Comment on a published post, optionally replying to another comment
    /// on the same post.
    pub async fn add(
        &self,
        actor: &Actor,
        post_slug: &str,
        input: AddCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_slug(post_slug).await?;
        if !post.is_published() {
            return Err(AppError::PostNotFound(post_slug.to_string()));
        }

        if let Some(parent_id) = &input.parent_id {
            let parent = self.comment_repo.get_by_id(parent_id).await?;
            if parent.post_id != post.id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }
        }

        let now = chrono::Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(actor.user_id.clone()),
            content: Set(input.content),
            active: Set(true),
            parent_id: Set(input.parent_id),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let created = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = %created.id,
            post_id = %post.id,
            reply = created.is_reply(),
            "Comment added"
        );
        Ok(created)
    }

    /// Delete a comment and, through the foreign key, its replies.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(id).await?;
        ensure_can_delete_comment(actor, &comment)?;

        self.comment_repo.delete(id).await?;
        tracing::info!(comment_id = %id, deleted_by = %actor.user_id, "Comment deleted");
        Ok(comment)
    }

    /// Hide a comment from listings.
    pub async fn deactivate(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(id).await?;
        ensure_can_delete_comment(actor, &comment)?;

        if !comment.active {
            return Ok(comment);
        }
        self.comment_repo.set_active(comment, false).await
    }

    /// Restore a hidden comment (admins only).
    pub async fn reactivate(&self, actor: &Actor, id: &str) -> AppResult<comment::Model> {
        ensure_can_moderate(actor)?;

        let comment = self.comment_repo.get_by_id(id).await?;
        if comment.active {
            return Ok(comment);
        }
        self.comment_repo.set_active(comment, true).await
    }

    /// Number of active comments on a post, including replies whose parent
    /// is inactive and which [`build_threads`] therefore leaves out.
    pub async fn active_count(&self, post_id: &str) -> AppResult<u64> {
        self.comment_repo.count_active_by_post(post_id).await
    }
}
