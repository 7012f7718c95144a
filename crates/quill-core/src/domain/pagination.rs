//! Page requests and pagination metadata.

use serde::Serialize;

use crate::error::{DomainError, FieldError};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 50;
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A validated page request (1-based page, bounded limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Build a page request, applying defaults for absent values.
    ///
    /// Fails with a validation error when `page < 1` or `limit` is outside `1..=50`.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new("page", "Page must be a positive integer"));
        } else if Self::checked_offset(page, limit.max(1)).is_none() {
            errors.push(FieldError::new("page", "Page is out of range"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.push(FieldError::new(
                "limit",
                format!("Limit must be between 1 and {}", MAX_LIMIT),
            ));
        }

        if errors.is_empty() {
            Ok(Self { page, limit })
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        Self::checked_offset(self.page, self.limit).unwrap_or(MAX_OFFSET)
    }

    /// Offsets must fit a Postgres `BIGINT`.
    fn checked_offset(page: u64, limit: u64) -> Option<u64> {
        page.checked_sub(1)
            .and_then(|p| p.checked_mul(limit))
            .filter(|offset| *offset <= MAX_OFFSET)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the total number of matching items.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// A page of items together with its pagination metadata.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(page: Page<T>, request: PageRequest) -> Self {
        Self {
            meta: PageMeta::new(request, page.total),
            items: page.items,
        }
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit);
        Self {
            current_page: request.page,
            total_pages,
            total,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_last_page_of_23_items() {
        let req = PageRequest::new(Some(3), Some(10)).unwrap();
        let meta = PageMeta::new(req, 23);

        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_first_page_has_next() {
        let meta = PageMeta::new(PageRequest::new(Some(1), Some(10)).unwrap(), 23);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_empty_result() {
        let meta = PageMeta::new(PageRequest::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let Err(DomainError::Validation(errors)) = PageRequest::new(Some(0), Some(51)) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "page");
        assert_eq!(errors[1].field, "limit");

        assert!(PageRequest::new(Some(1), Some(0)).is_err());
        assert!(PageRequest::new(Some(1), Some(50)).is_ok());
    }

    #[test]
    fn test_page_whose_offset_overflows_is_rejected() {
        let Err(DomainError::Validation(errors)) = PageRequest::new(Some(u64::MAX), Some(10))
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "page");

        let largest = PageRequest::new(Some(i64::MAX as u64 / 50 + 1), Some(50)).unwrap();
        assert!(largest.offset() <= i64::MAX as u64);
    }
}
