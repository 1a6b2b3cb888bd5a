//! Paged API responses.

use serde::{Deserialize, Serialize};

/// Upper bound mod.io accepts for `_limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of a paged listing, as returned by the mod.io API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPage<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Number of items on this page.
    #[serde(default)]
    pub result_count: u32,
    /// Offset of the first item.
    #[serde(default)]
    pub result_offset: u32,
    /// Requested page size.
    #[serde(default)]
    pub result_limit: u32,
    /// Total number of items across all pages.
    #[serde(default)]
    pub result_total: u32,
}

impl<T> RequestPage<T> {
    /// Builds a page from its items.
    #[must_use]
    pub fn new(data: Vec<T>, offset: u32, limit: u32, total: u32) -> Self {
        let result_count = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            data,
            result_count,
            result_offset: offset,
            result_limit: limit,
            result_total: total,
        }
    }

    /// Page with no items.
    #[must_use]
    pub fn empty(offset: u32, limit: u32) -> Self {
        Self::new(Vec::new(), offset, limit, 0)
    }

    /// Zero-based index of this page.
    #[must_use]
    pub const fn page_index(&self) -> u32 {
        if self.result_limit == 0 {
            0
        } else {
            self.result_offset / self.result_limit
        }
    }

    /// Number of pages needed to list every item.
    #[must_use]
    pub const fn page_count(&self) -> u32 {
        if self.result_limit == 0 {
            0
        } else {
            self.result_total.div_ceil(self.result_limit)
        }
    }

    /// Returns true if more items exist after this page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.result_offset.saturating_add(self.result_count) < self.result_total
    }

    /// Maps the page items, keeping the paging fields.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> RequestPage<U> {
        RequestPage {
            data: self.data.into_iter().map(f).collect(),
            result_count: self.result_count,
            result_offset: self.result_offset,
            result_limit: self.result_limit,
            result_total: self.result_total,
        }
    }
}

/// Query for one page of mod profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Full-text search filter.
    pub search: Option<String>,
    /// Offset of the first item.
    pub offset: u32,
    /// Page size, clamped to [`MAX_PAGE_SIZE`].
    pub limit: u32,
}

impl PageQuery {
    /// Query for `limit` items starting at `offset`.
    #[must_use]
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            search: None,
            offset,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Adds a search filter.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }
}
