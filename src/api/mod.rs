//! REST API shared utilities (response envelopes, pagination, query parsing)

pub mod auth;
pub mod client;
pub mod compliance;
pub mod document;
pub mod health;
pub mod invoice;
pub mod metrics;

use crate::domain::{PageRequest, SortOrder, StringUuid};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;

/// `{success: true, message, data}`
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// `{success: true, message}` for operations that return nothing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// List envelope: the page of items in `data`, counts in `pagination`
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: PageRequest, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        let total_pages = (total_count + page.limit - 1) / page.limit;
        Self {
            current_page: page.page,
            total_pages,
            total_count,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(message: impl Into<String>, data: T, page: PageRequest, total: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            pagination: Pagination::new(page, total),
        }
    }
}

/// Path identifier; anything but a UUID is a 400
pub(crate) fn parse_id(raw: &str) -> Result<StringUuid> {
    StringUuid::parse_str(raw).map_err(|_| AppError::invalid_id())
}

/// Optional UUID filter from the query string; blank means "no filter"
pub(crate) fn parse_optional_id(raw: Option<&str>) -> Result<Option<StringUuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_id(value).map(Some),
        None => Ok(None),
    }
}

/// `page` and `limit` as sent; unparsable values fall back to the defaults
/// and everything is clamped by `PageRequest`.
pub(crate) fn page_request(page: Option<&str>, limit: Option<&str>) -> PageRequest {
    let parse = |value: Option<&str>, default: i64| {
        value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default)
    };
    PageRequest::new(parse(page, 1), parse(limit, PageRequest::DEFAULT_LIMIT))
}

pub(crate) fn sort_order(raw: Option<&str>, default: SortOrder) -> SortOrder {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        _ => default,
    }
}

/// Whitelisted sort column; unknown names fall back to the default column
pub(crate) fn sort_key<K: DeserializeOwned + Default>(raw: Option<&str>) -> K {
    raw.and_then(|s| serde_json::from_value(serde_json::Value::String(s.trim().to_string())).ok())
        .unwrap_or_default()
}

/// Enum filter such as `status=PAID`. Blank and `all` mean "no filter".
pub(crate) fn enum_filter<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::invalid_field(field, "enum", format!("Invalid {}: {}", field, value)))
}

pub(crate) fn flag(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some(v) if v.eq_ignore_ascii_case("true") || v == "1")
}
