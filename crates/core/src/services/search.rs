//! Advanced post search.

use chrono::{Days, NaiveDate, NaiveTime};
use quill_common::{AppError, AppResult};
use quill_db::{
    entities::post,
    repositories::{Page, PostFilter, PostOrder, PostRepository},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;

/// Search service for business logic.
#[derive(Clone)]
pub struct SearchService {
    post_repo: PostRepository,
    page_size: u64,
}

/// Search criteria. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvancedSearch {
    /// Matched against title, content, excerpt and author username
    pub query: Option<String>,
    pub author_id: Option<String>,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
    /// First creation day included
    pub date_from: Option<NaiveDate>,
    /// Last creation day included
    pub date_to: Option<NaiveDate>,
}

fn start_of(day: NaiveDate) -> DateTimeWithTimeZone {
    day.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, page_size: u64) -> Self {
        Self {
            post_repo,
            page_size,
        }
    }

    /// Published posts matching `search`, newest first.
    pub async fn advanced(&self, search: &AdvancedSearch, page: u64) -> AppResult<Page<post::Model>> {
        if let (Some(from), Some(to)) = (search.date_from, search.date_to) {
            if from > to {
                return Err(AppError::BadRequest(format!(
                    "date_from ({from}) is after date_to ({to})"
                )));
            }
        }

        let filter = PostFilter {
            query: search.query.clone(),
            query_matches_author: true,
            author_id: search.author_id.clone(),
            category_id: search.category_id.clone(),
            tag_id: search.tag_id.clone(),
            created_from: search.date_from.map(start_of),
            created_until: search
                .date_to
                .and_then(|day| day.checked_add_days(Days::new(1)))
                .map(start_of),
            ..PostFilter::published()
        };

        self.post_repo
            .find_page(&filter, PostOrder::Published, page, self.page_size)
            .await
    }
}
