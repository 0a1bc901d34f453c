//! Page math shared by every list endpoint.
//!
//! Pages are 1-based. `total_pages = ceil(total / page_size)`.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// `?page=&page_size=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageParams {
    /// Resolves defaults and rejects out-of-range values.
    pub fn resolve(&self) -> Result<(u64, u64), AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        // The driver takes the offset as an i64
        let in_range = (page - 1)
            .checked_mul(page_size)
            .is_some_and(|skip| skip <= i64::MAX as u64);
        if !in_range {
            return Err(AppError::Validation("page is out of range".to_string()));
        }
        Ok((page, page_size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    pub fn new(total_count: u64, page: u64, page_size: u64) -> Self {
        let total_pages = total_count.div_ceil(page_size.max(1));
        Self {
            total_count,
            total_pages,
            current_page: page,
            page_size,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Number of records to skip before this page. Saturates; `PageParams::resolve`
    /// rejects pages whose offset does not fit.
    pub fn skip(page: u64, page_size: u64) -> u64 {
        page.saturating_sub(1).saturating_mul(page_size)
    }
}

/// One page of results plus the navigation fields list clients expect.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub total_pages: u64,
    pub current_page: u64,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, pagination: Pagination) -> Self {
        let page = pagination.current_page;
        Self {
            results,
            count: pagination.total_count,
            next: pagination.has_next.then(|| format!("?page={}", page + 1)),
            previous: pagination.has_previous.then(|| format!("?page={}", page - 1)),
            total_pages: pagination.total_pages,
            current_page: page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            count: self.count,
            next: self.next,
            previous: self.previous,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_23_records_in_pages_of_10_is_3_pages() {
        let p = Pagination::new(23, 3, 10);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next);
        assert!(p.has_previous);
    }

    #[test]
    fn test_first_page_has_next_but_no_previous() {
        let p = Pagination::new(23, 1, 10);
        assert!(p.has_next);
        assert!(!p.has_previous);
    }

    #[test]
    fn test_exact_multiple_does_not_add_a_page() {
        assert_eq!(Pagination::new(20, 1, 10).total_pages, 2);
    }

    #[test]
    fn test_empty_collection_has_zero_pages() {
        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_previous);
    }

    #[test]
    fn test_skip_is_zero_based_offset() {
        assert_eq!(Pagination::skip(1, 10), 0);
        assert_eq!(Pagination::skip(3, 10), 20);
    }

    #[test]
    fn test_page_links() {
        let page = Page::new(vec![1, 2, 3], Pagination::new(23, 2, 10));
        assert_eq!(page.next.as_deref(), Some("?page=3"));
        assert_eq!(page.previous.as_deref(), Some("?page=1"));
        assert_eq!(page.count, 23);
    }

    #[test]
    fn test_params_default_to_first_page_of_ten() {
        assert_eq!(PageParams::default().resolve().unwrap(), (1, 10));
    }

    #[test]
    fn test_params_reject_zero_page_and_oversized_pages() {
        let zero = PageParams {
            page: Some(0),
            page_size: None,
        };
        assert!(zero.resolve().is_err());

        let huge = PageParams {
            page: Some(1),
            page_size: Some(MAX_PAGE_SIZE + 1),
        };
        assert!(huge.resolve().is_err());
    }

    #[test]
    fn test_params_reject_pages_whose_offset_overflows() {
        let last = PageParams {
            page: Some(u64::MAX),
            page_size: Some(MAX_PAGE_SIZE),
        };
        assert!(matches!(last.resolve(), Err(AppError::Validation(_))));

        let past_i64 = PageParams {
            page: Some(i64::MAX as u64),
            page_size: Some(2),
        };
        assert!(past_i64.resolve().is_err());

        let far_but_valid = PageParams {
            page: Some(1_000_000),
            page_size: Some(MAX_PAGE_SIZE),
        };
        assert_eq!(far_but_valid.resolve().unwrap(), (1_000_000, MAX_PAGE_SIZE));
        assert_eq!(Pagination::skip(u64::MAX, MAX_PAGE_SIZE), u64::MAX);
    }
}
