use uuid::Uuid;

use super::ApiError;
use crate::db::{BookshelfSort, StorySort};
use crate::domain::{Role, SortOrder, UserStatus};

pub fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::validation(format!("Invalid {kind} id: '{raw}'")))
}

pub fn validate_chapter_number(number: i32) -> Result<i32, ApiError> {
    if number <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid chapter number: {number}. Chapter number must be a positive integer"
        )));
    }
    Ok(number)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

/// Ranking and latest listings: default 10, capped at 100.
pub fn clamp_limit(limit: Option<i64>) -> u64 {
    const DEFAULT_LIMIT: u64 = 10;
    const MAX_LIMIT: i64 = 100;

    match limit {
        Some(l) if (1..=MAX_LIMIT).contains(&l) => l.unsigned_abs(),
        Some(l) if l > MAX_LIMIT => MAX_LIMIT.unsigned_abs(),
        _ => DEFAULT_LIMIT,
    }
}

pub fn parse_story_sort(raw: Option<&str>) -> Result<StorySort, ApiError> {
    raw.map_or(Ok(StorySort::default()), |s| {
        s.parse().map_err(ApiError::ValidationError)
    })
}

pub fn parse_bookshelf_sort(raw: Option<&str>) -> Result<BookshelfSort, ApiError> {
    raw.map_or(Ok(BookshelfSort::default()), |s| {
        s.parse().map_err(ApiError::ValidationError)
    })
}

pub fn parse_sort_order(raw: Option<&str>) -> Result<SortOrder, ApiError> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("desc") => Ok(SortOrder::Desc),
        Some("asc") => Ok(SortOrder::Asc),
        Some(other) => Err(ApiError::validation(format!(
            "Invalid sort_order '{other}'. Use 'asc' or 'desc'"
        ))),
    }
}

pub fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse().map_err(ApiError::ValidationError)
}

pub fn parse_status(raw: &str) -> Result<UserStatus, ApiError> {
    raw.parse().map_err(ApiError::ValidationError)
}
