//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod analytics;
pub mod category;
pub mod comment;
pub mod newsletter;
pub mod policy;
pub mod post;
pub mod reaction;
pub mod reading_progress;
pub mod search;
pub mod tag;

pub use account::{AccountService, ProfileView, RegisterInput, Session, UpdateProfileInput};
pub use analytics::{AnalyticsService, Dashboard};
pub use category::{CategoryService, CategoryWithCount, CreateCategoryInput};
pub use comment::{AddCommentInput, CommentService, CommentThread};
pub use newsletter::{NewsletterService, SubscribeOutcome};
pub use policy::Actor;
pub use post::{
    CreatePostInput, PostAuthor, PostDetail, PostListQuery, PostService, UpdatePostInput,
};
pub use reaction::{ReactionOutcome, ReactionResult, ReactionService, ReactionTally};
pub use reading_progress::ReadingProgressService;
pub use search::{AdvancedSearch, SearchService};
pub use tag::{CreateTagInput, TagService};
