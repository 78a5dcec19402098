//! Role-based authorization rules.
//!
//! Every check runs before the corresponding write, so a denied request
//! never touches the store.

use quill_common::{AppError, AppResult};
use quill_db::entities::{comment, post, user_profile::Role};
use serde::Serialize;

/// The authenticated requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[must_use]
    pub const fn can_create(&self) -> bool {
        self.role.can_create_posts()
    }

    #[must_use]
    pub const fn can_moderate(&self) -> bool {
        self.role.can_moderate()
    }

    /// Whether the actor wrote the post or moderates.
    #[must_use]
    pub fn can_modify_post(&self, post: &post::Model) -> bool {
        post.author_id == self.user_id || self.can_moderate()
    }

    /// Whether the actor wrote the comment or moderates.
    #[must_use]
    pub fn can_delete_comment(&self, comment: &comment::Model) -> bool {
        comment.author_id == self.user_id || self.can_moderate()
    }
}

fn deny(actor: &Actor, notice: &str) -> AppError {
    tracing::warn!(user_id = %actor.user_id, role = actor.role.as_str(), "{notice}");
    AppError::Forbidden(notice.to_string())
}

/// Authors and admins only.
pub fn ensure_can_create(actor: &Actor) -> AppResult<()> {
    if actor.can_create() {
        Ok(())
    } else {
        Err(deny(actor, "Only authors and admins can create content."))
    }
}

/// Admins only.
pub fn ensure_can_moderate(actor: &Actor) -> AppResult<()> {
    if actor.can_moderate() {
        Ok(())
    } else {
        Err(deny(actor, "Only admins can perform this action."))
    }
}

pub fn ensure_can_modify_post(actor: &Actor, post: &post::Model) -> AppResult<()> {
    if actor.can_modify_post(post) {
        Ok(())
    } else {
        Err(deny(actor, "You can only modify your own posts."))
    }
}

pub fn ensure_can_delete_comment(actor: &Actor, comment: &comment::Model) -> AppResult<()> {
    if actor.can_delete_comment(comment) {
        Ok(())
    } else {
        Err(deny(actor, "You can only delete your own comments."))
    }
}
