//! Advanced search endpoint.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_core::AdvancedSearch;
use quill_db::{entities::post, repositories::Page};
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// `GET /search` query string. Dates are `YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<u64>,
}

fn parse_date(field: &str, value: Option<String>) -> AppResult<Option<chrono::NaiveDate>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            chrono::NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| {
                quill_common::AppError::BadRequest(format!("{field}: expected YYYY-MM-DD, got '{v}'"))
            })
        })
        .transpose()
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<ApiResponse<Page<post::Model>>> {
    let search = AdvancedSearch {
        query: query.query,
        author_id: query.author,
        category_id: query.category,
        tag_id: query.tag,
        date_from: parse_date("date_from", query.date_from)?,
        date_to: parse_date("date_to", query.date_to)?,
    };
    let page = query.page.unwrap_or(1).max(1);
    Ok(ApiResponse::ok(state.search_service.advanced(&search, page).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}
