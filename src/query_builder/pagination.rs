//! # Pagination
//!
//! LIMIT/OFFSET handling plus the page-resolution convention: page number
//! and page size are read from the request parameters themselves
//! (`current_page` / `per_page`), with defaults and a hard per-page
//! ceiling. The [`Page`] envelope pairs a page of rows with the total
//! count and derived page metadata.

use serde::Serialize;
use serde_json::Value;

use crate::params::ParamMap;

/// Default page size when the request does not specify one.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// Hard ceiling on the requested page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters for a compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    /// Create pagination from a 1-indexed page number and per-page count.
    /// The page number is caller-supplied and unbounded, so the offset
    /// saturates instead of overflowing.
    pub fn new(page: u32, per_page: u32) -> Self {
        let offset = if page > 0 {
            Some((page - 1).saturating_mul(per_page))
        } else {
            None
        };
        Self {
            limit: Some(per_page),
            offset,
        }
    }

    /// Create pagination with only a limit.
    pub fn limit_only(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    /// Resolve `(page, per_page)` from raw request parameters.
    ///
    /// Reads `current_page` and `per_page`, accepting both numbers and
    /// numeric strings. Missing or malformed values fall back to page 1
    /// and [`DEFAULT_PER_PAGE`]; the page size is clamped to
    /// `1..=MAX_PER_PAGE`.
    pub fn from_params(params: &ParamMap) -> Self {
        let page = read_u32(params.get("current_page")).unwrap_or(1).max(1);
        let per_page = read_u32(params.get("per_page"))
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self::new(page, per_page)
    }

    /// Convert to SQL string.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Calculate total pages given a total count.
    pub fn total_pages(&self, total_count: u32) -> u32 {
        match self.limit {
            Some(limit) if limit > 0 => total_count.div_ceil(limit),
            _ => 1,
        }
    }

    /// Get current page number (1-indexed).
    pub fn current_page(&self) -> u32 {
        if let (Some(limit), Some(offset)) = (self.limit, self.offset) {
            if limit > 0 {
                return (offset / limit) + 1;
            }
        }
        1
    }

    /// Check if there's a next page.
    pub fn has_next_page(&self, total_count: u32) -> bool {
        if let (Some(limit), Some(offset)) = (self.limit, self.offset) {
            offset.saturating_add(limit) < total_count
        } else {
            false
        }
    }

    /// Check if there's a previous page.
    pub fn has_previous_page(&self) -> bool {
        self.offset.is_some_and(|offset| offset > 0)
    }
}

fn read_u32(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A page of rows with total count and page metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit.unwrap_or(DEFAULT_PER_PAGE);
        let clamped_total = u32::try_from(total.max(0)).unwrap_or(u32::MAX);
        Self {
            rows,
            total,
            current_page: pagination.current_page(),
            per_page,
            total_pages: pagination.total_pages(clamped_total),
        }
    }
}

/// One row of a grouped fetch: the group's value (cast to text) and the
/// number of rows it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GroupRow {
    pub group_value: Option<String>,
    pub group_count: i64,
}
