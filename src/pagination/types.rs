//! Pagination types
//!
//! Page arithmetic shared by the page cursor and the incremental loader.

use serde::{Deserialize, Serialize};

/// Number of pages needed for `total_count` items, `ceil(total / size)`
///
/// A page size of zero yields zero pages.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Cursor following `page`, or `None` once past the last page
pub fn next_page_param(page: u32, total_count: u64, page_size: u32) -> Option<u32> {
    let next = page.checked_add(1)?;
    (next <= total_pages(total_count, page_size)).then_some(next)
}

/// Page cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// 1-based page being viewed
    pub current_page: u32,
    /// Posts per page, never zero
    pub page_size: u32,
    /// Collection size from the latest response, `None` before any
    pub total_count: Option<u64>,
}

impl PaginationState {
    /// Start on page 1; a zero page size is raised to 1
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_count: None,
        }
    }

    /// Pages available; at least 1 so the current page stays valid
    pub fn total_pages(&self) -> u32 {
        self.total_count
            .map_or(1, |total| total_pages(total, self.page_size))
            .max(1)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// True when `page` lies in `[1, total_pages]`
    pub fn contains(&self, page: u32) -> bool {
        (1..=self.total_pages()).contains(&page)
    }

    /// Move forward one page if possible
    pub fn next_page(&mut self) -> Option<u32> {
        if !self.has_next() {
            return None;
        }
        self.current_page += 1;
        Some(self.current_page)
    }

    /// Move back one page if possible
    pub fn prev_page(&mut self) -> Option<u32> {
        if !self.has_prev() {
            return None;
        }
        self.current_page -= 1;
        Some(self.current_page)
    }

    /// Jump to `page` if it exists
    pub fn go_to(&mut self, page: u32) -> Option<u32> {
        if !self.contains(page) {
            return None;
        }
        self.current_page = page;
        Some(page)
    }

    /// Record a new total; returns the clamped page if the cursor had to move
    pub fn set_total_count(&mut self, total_count: u64) -> Option<u32> {
        self.total_count = Some(total_count);
        let last = self.total_pages();
        if self.current_page > last {
            self.current_page = last;
            return Some(last);
        }
        None
    }
}
