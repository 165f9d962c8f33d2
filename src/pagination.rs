//! Page requests and the `{items, meta}` listing envelope.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// A requested page. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    /// Clamps both values to a minimum of 1.
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// SQL OFFSET value. `None` when the page lies beyond what an `i64` can address.
    pub fn checked_offset(&self) -> Option<i64> {
        (i64::from(self.number) - 1).checked_mul(i64::from(self.size))
    }

    /// SQL OFFSET value, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// Metadata
///
/// Navigation info attached to every paginated listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Metadata {
    pub total_items: i64,
    pub total_page: i64,
    pub previous_page: i64,
    pub current_page: i64,
    pub next_page: i64,
    pub limit_per_page: i64,
}

/// Paginated
///
/// A page of items with its navigation metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: Metadata,
}

impl<T> Paginated<T> {
    /// Wraps one page of a result whose full size is `total_items`.
    pub fn new(items: Vec<T>, total_items: i64, page: PageRequest) -> Self {
        Self {
            items,
            meta: create_meta(total_items, page.size, page.number),
        }
    }

    /// The whole result on a single page, used when paging is ignored.
    pub fn single_page(items: Vec<T>) -> Self {
        let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let size = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self::new(items, total, PageRequest::new(1, size))
    }
}

/// create_meta
///
/// `totalPage` is `ceil(totalItems / pageSize)` but never below 1; next and previous
/// pages are clamped to `[1, totalPage]`. `page_size` must be non-zero.
pub fn create_meta(total_items: i64, page_size: u32, page_number: u32) -> Metadata {
    let size = i64::from(page_size.max(1));
    let current = i64::from(page_number);
    let total_items = total_items.max(0);

    let total_page = ((total_items + size - 1) / size).max(1);
    let next_page = (current + 1).clamp(1, total_page);
    let previous_page = (current - 1).clamp(1, total_page);

    Metadata {
        total_items,
        total_page,
        previous_page,
        current_page: current,
        next_page,
        limit_per_page: size,
    }
}
