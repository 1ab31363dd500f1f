//! Pagination types
//!
//! Page numbers start at 1.

use serde::{Deserialize, Serialize};

/// One page of a larger list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    /// Current page (1-based, clamped into range)
    pub page: u32,
    /// Items per page
    pub limit: u32,
    /// Total number of pages (at least 1)
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            (total.div_ceil(limit as u64) as u32).max(1)
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Slice `items` into the requested page. Out-of-range pages are
    /// clamped to the last page; `limit == 0` returns everything.
    pub fn from_items(items: Vec<T>, page: u32, limit: u32) -> Self {
        if limit == 0 {
            return Self::single_page(items);
        }
        let total = items.len() as u64;
        let total_pages = (total.div_ceil(limit as u64) as u32).max(1);
        let page = page.clamp(1, total_pages);
        let start = ((page - 1) * limit) as usize;
        let data: Vec<T> = items.into_iter().skip(start).take(limit as usize).collect();
        Self::new(data, total, page, limit)
    }

    /// Create a single-page response (no pagination)
    pub fn single_page(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            data,
            total,
            page: 1,
            limit: total as u32,
            total_pages: 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2], 25, 1, 10);
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn test_from_items_slices_page() {
        let page = PaginatedResponse::from_items((1..=25).collect(), 3, 10);
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.page, 3);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_from_items_clamps_page() {
        let page = PaginatedResponse::from_items((1..=5).collect(), 9, 2);
        assert_eq!(page.page, 3);
        assert_eq!(page.data, vec![5]);

        let page = PaginatedResponse::from_items((1..=5).collect(), 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.data, vec![1, 2]);
    }

    #[test]
    fn test_single_page() {
        let page = PaginatedResponse::from_items(vec!["a", "b"], 4, 0);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.data.len(), 2);
    }
}
