//! Incremental loader state

use crate::error::Error;
use crate::pagination::next_page_param;
use crate::types::{Page, Post};

/// Where the loader is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderStatus {
    /// Waiting for the next signal
    #[default]
    Ready,
    /// A page is being fetched
    FetchingNext,
    /// The cursor ran past the last page
    Exhausted,
}

/// A loaded page together with the cursor it was fetched under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfinitePage {
    pub page_param: u32,
    pub page: Page,
}

/// Everything loaded so far
#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteState {
    /// Pages in the order they arrived
    pub pages: Vec<InfinitePage>,
    /// Page to fetch next, `None` once exhausted
    pub next_cursor: Option<u32>,
    pub status: LoaderStatus,
    /// Error of the latest fetch, cleared on success
    pub error: Option<Error>,
    pub page_size: u32,
    pub(crate) epoch: u64,
}

impl InfiniteState {
    /// Fresh state with the cursor on page 1
    pub fn new(page_size: u32) -> Self {
        Self {
            pages: Vec::new(),
            next_cursor: Some(1),
            status: LoaderStatus::Ready,
            error: None,
            page_size: page_size.max(1),
            epoch: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn is_fetching_next(&self) -> bool {
        self.status == LoaderStatus::FetchingNext
    }

    /// First page still loading
    pub fn is_initial_loading(&self) -> bool {
        self.is_fetching_next() && self.pages.is_empty()
    }

    /// All posts in page order
    pub fn items(&self) -> impl Iterator<Item = &Post> {
        self.pages.iter().flat_map(|p| p.page.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.page.len()).sum()
    }

    /// Total reported by the most recent page
    pub fn total_count(&self) -> Option<u64> {
        self.pages.last().map(|p| p.page.total_count)
    }

    /// Append `page` and move the cursor
    pub(crate) fn append(&mut self, page_param: u32, page: Page) {
        self.next_cursor = next_page_param(page_param, page.total_count, self.page_size);
        self.pages.push(InfinitePage { page_param, page });
        self.error = None;
        self.status = if self.next_cursor.is_some() {
            LoaderStatus::Ready
        } else {
            LoaderStatus::Exhausted
        };
    }

    /// Record a failed fetch; the cursor stays put
    pub(crate) fn fail(&mut self, error: Error) {
        self.error = Some(error);
        self.status = LoaderStatus::Ready;
    }
}
