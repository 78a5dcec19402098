//! Reaction toggle.
//!
//! Reacting with the type already chosen retracts the reaction, reacting with
//! a different type switches it, and the first reaction creates it. Each step
//! is a conditional write, so the outcome is decided by the database rather
//! than by a prior read.

use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::{
    entities::post_reaction::ReactionType,
    repositories::{PostRepository, ReactionCount, ReactionRepository, new_reaction},
};
use sea_orm::Iterable;
use serde::Serialize;

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOutcome {
    Added,
    Removed,
    Switched,
}

/// Count of one reaction type on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionTally {
    pub reaction_type: ReactionType,
    pub emoji: &'static str,
    pub count: i64,
}

/// Result of a toggle, with the post's counts after the change.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionResult {
    pub outcome: ReactionOutcome,
    pub reaction_type: ReactionType,
    pub tallies: Vec<ReactionTally>,
}

/// One tally per reaction type, in declaration order, zero when absent.
#[must_use]
pub fn tally(counts: &[ReactionCount]) -> Vec<ReactionTally> {
    ReactionType::iter()
        .map(|reaction_type| ReactionTally {
            reaction_type,
            emoji: reaction_type.emoji(),
            count: counts
                .iter()
                .find(|c| c.reaction_type == reaction_type)
                .map_or(0, |c| c.count),
        })
        .collect()
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(reaction_repo: ReactionRepository, post_repo: PostRepository) -> Self {
        Self {
            reaction_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle `user_id`'s reaction on a published post.
    pub async fn react(
        &self,
        user_id: &str,
        post_slug: &str,
        reaction_type: ReactionType,
    ) -> AppResult<ReactionResult> {
        let post = self.post_repo.get_by_slug(post_slug).await?;
        if !post.is_published() {
            return Err(AppError::PostNotFound(post_slug.to_string()));
        }

        let outcome = if self
            .reaction_repo
            .delete_matching(&post.id, user_id, reaction_type)
            .await?
            > 0
        {
            ReactionOutcome::Removed
        } else if self
            .reaction_repo
            .switch_type(&post.id, user_id, reaction_type)
            .await?
            > 0
        {
            ReactionOutcome::Switched
        } else {
            let model = new_reaction(self.id_gen.generate(), &post.id, user_id, reaction_type);
            self.reaction_repo.upsert(model).await?;
            ReactionOutcome::Added
        };

        tracing::debug!(
            post_id = %post.id,
            user_id = %user_id,
            reaction = reaction_type.as_str(),
            ?outcome,
            "Reaction toggled"
        );

        let counts = self.reaction_repo.count_by_type(&post.id).await?;
        Ok(ReactionResult {
            outcome,
            reaction_type,
            tallies: tally(&counts),
        })
    }
}
