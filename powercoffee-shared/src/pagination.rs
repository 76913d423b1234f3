//! Pagination utilities
//!
//! Page requests are 0-based and carry a sort field and direction. Sort fields
//! arrive from clients in camelCase and are resolved against a per-resource
//! whitelist before they ever reach SQL.

use serde::{Deserialize, Serialize};

/// Default page number (0-based)
pub const DEFAULT_PAGE_NUMBER: u32 = 0;

/// Default page size
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default sort field
pub const DEFAULT_SORT_BY: &str = "id";

/// Default sort direction
pub const DEFAULT_SORT_DIRECTION: &str = "asc";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses a direction case-insensitively; anything other than "desc" is ascending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A page request: which slice of a sorted collection to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page_number: u32,

    /// Items per page, clamped to `1..=MAX_PAGE_SIZE`
    pub page_size: u32,

    /// Requested sort field, as sent by the client
    pub sort_by: String,

    /// Sort direction
    pub sort_dir: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_dir: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    /// Builds a page request, filling in defaults for missing values
    pub fn new(
        page_number: Option<u32>,
        page_size: Option<u32>,
        sort_by: Option<String>,
        sort_dir: Option<String>,
    ) -> Self {
        Self {
            page_number: page_number.unwrap_or(DEFAULT_PAGE_NUMBER),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            sort_by: sort_by
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
            sort_dir: SortDirection::parse(
                sort_dir.as_deref().unwrap_or(DEFAULT_SORT_DIRECTION),
            ),
        }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number) * i64::from(self.page_size)
    }

    /// Page size as a SQL limit
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Resolves the requested sort field against a whitelist of
    /// `(client_name, column)` pairs
    ///
    /// Unknown fields fall back to the first entry of the whitelist.
    pub fn sort_column<'a>(&self, allowed: &'a [(&'a str, &'a str)]) -> &'a str {
        allowed
            .iter()
            .find(|(name, column)| {
                self.sort_by.eq_ignore_ascii_case(name) || self.sort_by.eq_ignore_ascii_case(column)
            })
            .or_else(|| allowed.first())
            .map(|(_, column)| *column)
            .unwrap_or(DEFAULT_SORT_BY)
    }
}

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
    pub last: bool,
}

impl<T> PaginationResponse<T> {
    /// Wraps a page of content with totals derived from `total_elements`
    pub fn new(content: Vec<T>, page: &PageRequest, total_elements: i64) -> Self {
        let size = i64::from(page.page_size.max(1));
        let total_pages = ((total_elements + size - 1) / size).max(0) as u32;

        Self {
            content,
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements,
            total_pages,
            last: page.page_number.saturating_add(1) >= total_pages,
        }
    }
}
