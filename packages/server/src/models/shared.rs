use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw `page`/`limit` query parameters. Kept as strings so that garbage falls
/// back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-based, default 1).
    pub page: Option<String>,
    /// Items per page (default 10, max 100).
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn resolve(&self) -> (u64, u64) {
        (
            parse_page(self.page.as_deref()),
            parse_limit(self.limit.as_deref()),
        )
    }
}

/// Parse a 1-based page number. Absent, non-numeric or zero gives 1.
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

/// Parse a page size. Absent, non-numeric or zero gives the default; large values are clamped.
pub fn parse_limit(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&l| l >= 1)
        .map(|l| l.min(MAX_PAGE_SIZE))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// One page of results plus totals.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    #[schema(example = 47)]
    pub total_docs: u64,
    #[schema(example = 10)]
    pub limit: u64,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 5)]
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, page: u64, limit: u64) -> Self {
        let total_pages = total_docs.div_ceil(limit);
        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    /// Zero-based row offset of `page`, clamped to what an SQL `OFFSET` accepts.
    pub fn offset(page: u64, limit: u64) -> u64 {
        page.saturating_sub(1)
            .saturating_mul(limit)
            .min(i64::MAX as u64)
    }

    /// Whether `page` lies past the last page of `total_docs` results.
    pub fn is_beyond(total_docs: u64, page: u64, limit: u64) -> bool {
        page > total_docs.div_ceil(limit)
    }
}

/// Parse a path or query identifier, reporting `what` on failure.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {what}")))
}

/// Public identity of a user embedded in other resources.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Alice Liddell")]
    pub full_name: String,
    pub avatar_url: String,
}

impl From<&user::Model> for OwnerSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

/// Return the trimmed value of a required text field, or `None` if it is blank.
pub fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
