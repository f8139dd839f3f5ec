//! Page boundary arithmetic and the page response shape
//!
//! Pagination is independent of caching: a request is validated and turned
//! into a [`PageWindow`] before any cache is touched.

use crate::error::{Error, Result};
use crate::record::EnrichedRecord;
use serde::{Deserialize, Serialize};

/// Default page size when a request omits it
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Validated `[from_index, to_index)` slice of the identifier registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub size: usize,
    pub from_index: usize,
    pub to_index: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub is_first: bool,
    pub is_last: bool,
}

impl PageWindow {
    /// Number of identifiers in the window
    pub fn len(&self) -> usize {
        self.to_index - self.from_index
    }

    pub fn is_empty(&self) -> bool {
        self.from_index == self.to_index
    }
}

/// Compute the window for `page` of `size` over `total_elements` identifiers
///
/// Fails with [`Error::InvalidRequest`] when `size <= 0`, `page < 0`, or the
/// page lies beyond the last page of a non-empty registry. With an empty
/// registry every non-negative page is valid and the window is empty.
pub fn paginate(page: i64, size: i64, total_elements: usize) -> Result<PageWindow> {
    if size <= 0 {
        return Err(Error::invalid(page, size, "size must be greater than 0"));
    }
    if page < 0 {
        return Err(Error::invalid(page, size, "page must not be negative"));
    }

    let page_idx = usize::try_from(page).map_err(|_| Error::invalid(page, size, "page out of range"))?;
    let size_idx = usize::try_from(size).map_err(|_| Error::invalid(page, size, "size out of range"))?;

    let total_pages = total_elements.div_ceil(size_idx);
    if total_elements > 0 && page_idx >= total_pages {
        return Err(Error::invalid(
            page,
            size,
            format!("page beyond last page ({} pages)", total_pages),
        ));
    }

    // Only reachable past the end when the registry is empty.
    let from_index = page_idx.saturating_mul(size_idx).min(total_elements);
    let to_index = from_index.saturating_add(size_idx).min(total_elements);

    Ok(PageWindow {
        page: page_idx,
        size: size_idx,
        from_index,
        to_index,
        total_elements,
        total_pages,
        is_first: page_idx == 0,
        // page >= totalPages - 1, which always holds when totalPages == 0
        is_last: page_idx + 1 >= total_pages,
    })
}

/// Page request as received from the request layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Resolve missing parameters to page 0 and `default_size`
    pub fn resolve(&self, default_size: usize) -> (i64, i64) {
        let default_size = i64::try_from(default_size).unwrap_or(i64::MAX);
        (self.page.unwrap_or(0), self.size.unwrap_or(default_size))
    }
}

/// One page of enriched records plus its paging metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub content: Vec<EnrichedRecord>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub first: bool,
    pub last: bool,
}

impl PageResponse {
    pub fn new(window: &PageWindow, content: Vec<EnrichedRecord>) -> Self {
        Self {
            content,
            page: window.page,
            size: window.size,
            total_elements: window.total_elements,
            total_pages: window.total_pages,
            first: window.is_first,
            last: window.is_last,
        }
    }

    /// Serialize the response body
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
