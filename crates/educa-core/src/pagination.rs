//! # Pagination
//!
//! Page-number pagination for list endpoints: `?page=N&page_size=M`, default
//! size 10, capped at 50. Responses carry the total count and relative links
//! to the neighbouring pages.

use crate::primitives::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::types::EducaError;
use serde::{Deserialize, Serialize};

/// Raw pagination parameters as they arrive in a query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Cut one page out of `items`.
    ///
    /// `base` is the request path with any extra query parameters
    /// (e.g. `/api/courses?subject=rust`); page links extend it.
    /// Asking for a page past the end is an error, except page 1 of an
    /// empty collection.
    pub fn paginate(items: Vec<T>, request: PageRequest, base: &str) -> Result<Self, EducaError> {
        let page = request.page() as usize;
        let size = request.page_size() as usize;
        let count = items.len();
        let last_page = count.div_ceil(size).max(1);

        if page > last_page {
            return Err(EducaError::not_found("page", page));
        }

        let start = (page - 1) * size;
        let results: Vec<T> = items.into_iter().skip(start).take(size).collect();

        let next = (page < last_page).then(|| link(base, page + 1, size));
        let previous = (page > 1).then(|| link(base, page - 1, size));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }

    /// Convert the results, keeping counts and links.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn link(base: &str, page: usize, size: usize) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}&page_size={size}")
}

// =============================================================================
// TESTS
// =============================================================================
