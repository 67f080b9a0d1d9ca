//! # Domain models
//!
//! Entities read from the database (`FromRow`), request DTOs validated with
//! `validator`, and response DTOs sent to clients.

mod locale;
mod catalog;
mod cart;
mod customer;
mod order;
mod translation;
mod partnership;
mod user;
mod dto;

pub use locale::*;
pub use catalog::*;
pub use cart::*;
pub use customer::*;
pub use order::*;
pub use translation::*;
pub use partnership::*;
pub use user::*;
pub use dto::*;

use serde::{Deserialize, Serialize};

// =====================================
// Identifiers
// =====================================
/// Fresh 21-character entity id.
///
/// # Example
/// ```rust
/// use drinks_storefront::models::new_id;
///
/// assert_eq!(new_id().len(), 21);
/// ```
#[must_use]
pub fn new_id() -> String {
    nanoid::nanoid!(21)
}

// =====================================
// Pagination
// =====================================
/// Page request, 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

/// Hard cap on page size.
pub const MAX_PER_PAGE: u32 = 100;

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(20).clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL offset
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }

    /// SQL limit, capped at [`MAX_PER_PAGE`]
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationInfo {
    #[must_use]
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.limit() as u64;
        let total_pages = u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX);

        Self {
            current_page: pagination.page,
            per_page: per_page as u32,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, pagination: &Pagination, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationInfo::new(pagination, total_items),
        }
    }

    /// Convert every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_limit() {
        assert_eq!(Pagination::new(Some(1), Some(20)).offset(), 0);
        assert_eq!(Pagination::new(Some(3), Some(10)).offset(), 20);
        assert_eq!(Pagination::new(Some(0), Some(500)).limit(), 100);
        assert_eq!(Pagination::new(None, None).page, 1);
    }

    #[test]
    fn test_pagination_info() {
        let info = PaginationInfo::new(&Pagination::new(Some(2), Some(10)), 35);

        assert_eq!(info.total_pages, 4);
        assert!(info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let info = PaginationInfo::new(&Pagination::default(), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
    }
}
