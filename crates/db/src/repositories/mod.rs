//! Repositories wrapping database access for each aggregate.

mod category;
mod comment;
mod newsletter;
mod post;
mod reaction;
mod reading_progress;
mod tag;
mod user;
mod user_profile;

pub use category::{CategoryPostCount, CategoryRepository};
pub use comment::CommentRepository;
pub use newsletter::NewsletterRepository;
pub use post::{PostFilter, PostOrder, PostRepository, StatusCount};
pub use reaction::{ReactionCount, ReactionRepository, new_reaction};
pub use reading_progress::ReadingProgressRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;

use serde::Serialize;

/// One page of results from an offset-paginated query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    /// Total number of pages (at least 1).
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.per_page == 0 || self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Map the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Escape `LIKE` wildcards and wrap the lowercased needle in `%`.
pub(crate) fn like_pattern(query: &str) -> String {
    format!(
        "%{}%",
        query
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page = Page { items: vec![1, 2], total: 21, page: 1, per_page: 10 };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let empty: Page<i32> = Page { items: vec![], total: 0, page: 1, per_page: 10 };
        assert_eq!(empty.total_pages(), 1);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }
}
