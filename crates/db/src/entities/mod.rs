//! Database entities.

#![allow(missing_docs)]

pub mod category;
pub mod comment;
pub mod newsletter_subscription;
pub mod post;
pub mod post_reaction;
pub mod post_tag;
pub mod reading_progress;
pub mod tag;
pub mod user;
pub mod user_profile;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use newsletter_subscription::Entity as NewsletterSubscription;
pub use post::Entity as Post;
pub use post_reaction::Entity as PostReaction;
pub use post_tag::Entity as PostTag;
pub use reading_progress::Entity as ReadingProgress;
pub use tag::Entity as Tag;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
