//! Pagination arithmetic and page metadata.
//!
//! Page numbers are 1-based. Nothing here panics: arithmetic saturates and a
//! page size of zero yields zero pages. Rejecting out-of-range input is the
//! job of [`validate`](crate::validate()).

use serde::{Deserialize, Serialize};

/// Skip/take bounds of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Window {
    pub skip: usize,
    pub take: usize,
}

impl Window {
    /// Returns the index range this window selects from `len` items.
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.skip.min(len);
        let end = start.saturating_add(self.take).min(len);
        start..end
    }
}

/// Computes the window for a 1-based page.
///
/// Page 0 is treated as page 1.
///
/// ```
/// use quarry::{window, Window};
///
/// assert_eq!(window(1, 20), Window { skip: 0, take: 20 });
/// assert_eq!(window(3, 20), Window { skip: 40, take: 20 });
/// ```
pub fn window(page: u32, page_size: u32) -> Window {
    let skip = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
    Window {
        skip,
        take: page_size as usize,
    }
}

/// Number of pages needed for `total` items, `ceil(total / page_size)`.
///
/// ```
/// use quarry::total_pages;
///
/// assert_eq!(total_pages(0, 10), 0);
/// assert_eq!(total_pages(11, 10), 2);
/// assert_eq!(total_pages(5, 0), 0);
/// ```
pub fn total_pages(total: usize, page_size: u32) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as usize)
}

/// Page metadata returned alongside results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    /// Number of matching items before windowing.
    pub total: usize,
    pub total_pages: usize,
}

impl PageInfo {
    pub fn new(page: u32, page_size: u32, total: usize) -> Self {
        PageInfo {
            page,
            page_size,
            total,
            total_pages: total_pages(total, page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// One page of results with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub page: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_table() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(100, 25), 4);
    }

    #[test]
    fn window_table() {
        assert_eq!(window(1, 20), Window { skip: 0, take: 20 });
        assert_eq!(window(3, 20), Window { skip: 40, take: 20 });
        assert_eq!(window(0, 20), Window { skip: 0, take: 20 });
    }

    #[test]
    fn window_saturates() {
        let w = window(u32::MAX, u32::MAX);
        assert_eq!(w.take, u32::MAX as usize);
        assert!(w.skip > 0);
        assert_eq!(w.range(10), 10..10);
    }

    #[test]
    fn range_clamps_to_len() {
        assert_eq!(window(2, 10).range(15), 10..15);
        assert_eq!(window(3, 10).range(15), 15..15);
        assert_eq!(window(1, 10).range(3), 0..3);
    }

    #[test]
    fn page_info_navigation() {
        let info = PageInfo::new(2, 10, 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next());
        assert!(info.has_previous());

        let last = PageInfo::new(3, 10, 25);
        assert!(!last.has_next());

        let empty = PageInfo::new(1, 10, 0);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }

    #[test]
    fn page_info_wire_format() {
        let json = serde_json::to_string(&PageInfo::new(1, 10, 11)).unwrap();
        assert_eq!(json, r#"{"page":1,"pageSize":10,"total":11,"totalPages":2}"#);
    }
}
