//! Page-number pagination types
//!
//! # Usage
//!
//! ```rust,ignore
//! let args = PaginationArgs { page: Some(2), page_size: Some(10) };
//! let validated = args.validate();
//!
//! // In model
//! let rows = query.push(" LIMIT ").push_bind(validated.limit())
//!     .push(" OFFSET ").push_bind(validated.offset());
//! ```

use serde::{Deserialize, Serialize};

/// Default page when none is requested.
pub const DEFAULT_PAGE: i64 = 1;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on items per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Upper bound on the page number; keeps `offset()` far from `i64::MAX`.
pub const MAX_PAGE: i64 = 1_000_000;

// ============================================================================
// Pagination Arguments
// ============================================================================

/// Raw pagination arguments as received from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationArgs {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Number of items per page.
    pub page_size: Option<i64>,
}

impl PaginationArgs {
    /// Apply defaults (page 1, size 20) and bounds (page 1-1_000_000, size 1-100).
    pub fn validate(&self) -> ValidatedPaginationArgs {
        let page = self.page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        ValidatedPaginationArgs { page, page_size }
    }
}

/// Validated and normalized pagination arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPaginationArgs {
    pub page: i64,
    pub page_size: i64,
}

impl Default for ValidatedPaginationArgs {
    fn default() -> Self {
        PaginationArgs::default().validate()
    }
}

impl ValidatedPaginationArgs {
    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .max(0)
    }
}

// ============================================================================
// Page
// ============================================================================

/// A page of results plus the total number of matches across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, args: &ValidatedPaginationArgs) -> Self {
        Self {
            items,
            total,
            page: args.page,
            page_size: args.page_size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
