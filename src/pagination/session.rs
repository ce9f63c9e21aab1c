//! Page cursor session
//!
//! Drives one paginated view: moves the cursor under its guards, runs the
//! page's query through the cache and folds each new total count back into
//! the cursor.

use super::types::PaginationState;
use crate::api::PageSource;
use crate::query::{CacheEntry, QueryCache, QueryKey, QueryObserver, QueryOptions};
use crate::types::Page;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Cache key of page `page`
pub fn page_key(page: u32) -> QueryKey {
    QueryKey::new("posts").with(page)
}

/// What a renderer needs to draw the view
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationSnapshot {
    pub state: PaginationState,
    pub entry: CacheEntry<Page>,
}

impl PaginationSnapshot {
    pub fn total_pages(&self) -> u32 {
        self.state.total_pages()
    }
}

/// One paginated view over a page source
pub struct PaginationSession<S: PageSource + ?Sized> {
    source: Arc<S>,
    observer: QueryObserver<Page>,
    state: Mutex<PaginationState>,
    updates: watch::Sender<PaginationSnapshot>,
}

impl<S: PageSource + ?Sized> PaginationSession<S> {
    /// Open a session on page 1; nothing is fetched until `load`
    pub fn new(cache: Arc<QueryCache<Page>>, source: Arc<S>, page_size: u32) -> Self {
        let state = PaginationState::new(page_size);
        let observer = QueryObserver::new(cache, page_key(1), QueryOptions::new().keep_previous());
        let (updates, _) = watch::channel(PaginationSnapshot {
            state,
            entry: observer.current(),
        });

        Self {
            source,
            observer,
            state: Mutex::new(state),
            updates,
        }
    }

    pub fn state(&self) -> PaginationState {
        *self.state.lock()
    }

    /// Entry of the page being viewed, previous data included
    pub fn current(&self) -> CacheEntry<Page> {
        self.observer.current()
    }

    pub fn snapshot(&self) -> PaginationSnapshot {
        PaginationSnapshot {
            state: self.state(),
            entry: self.current(),
        }
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<PaginationSnapshot> {
        self.updates.subscribe()
    }

    /// Fetch the page being viewed unless it is cached
    pub async fn load(&self) -> CacheEntry<Page> {
        let page = self.state.lock().current_page;
        self.show(page).await
    }

    /// Go to the next page; false at the last page
    pub async fn next(&self) -> bool {
        let target = self.state.lock().next_page();
        self.move_to(target, "next").await
    }

    /// Go to the previous page; false at page 1
    pub async fn prev(&self) -> bool {
        let target = self.state.lock().prev_page();
        self.move_to(target, "prev").await
    }

    /// Jump to `page`; false when it is out of range
    pub async fn go_to(&self, page: u32) -> bool {
        let target = self.state.lock().go_to(page);
        self.move_to(target, "go_to").await
    }

    /// Fetch the page being viewed again
    pub async fn refetch(&self) -> CacheEntry<Page> {
        let page = self.state.lock().current_page;
        let key = page_key(page);
        let source = Arc::clone(&self.source);
        let page_size = self.state.lock().page_size;

        self.observer
            .refetch(move || async move { source.fetch_page(page, page_size).await })
            .await;

        if let Some(clamped) = self.absorb(&key) {
            return self.show(clamped).await;
        }
        self.publish();
        self.current()
    }

    /// Unmount; a fetch still in flight is ignored when it lands
    pub fn close(&self) {
        self.observer.close();
    }

    async fn move_to(&self, target: Option<u32>, intent: &str) -> bool {
        match target {
            Some(page) => {
                self.show(page).await;
                true
            }
            None => {
                debug!("Ignoring {} at page {}", intent, self.state.lock().current_page);
                false
            }
        }
    }

    async fn show(&self, mut page: u32) -> CacheEntry<Page> {
        loop {
            let key = page_key(page);
            self.observer.set_key(key.clone());
            self.publish();

            let source = Arc::clone(&self.source);
            let page_size = self.state.lock().page_size;
            self.observer
                .run_for(&key, move || async move {
                    source.fetch_page(page, page_size).await
                })
                .await;

            match self.absorb(&key) {
                Some(clamped) => {
                    debug!("Total shrank, clamping to page {}", clamped);
                    page = clamped;
                }
                None => break,
            }
        }

        self.publish();
        self.current()
    }

    /// Fold the total of `key`'s data into the cursor if `key` is on screen
    ///
    /// Returns the page the cursor was clamped to, if any.
    fn absorb(&self, key: &QueryKey) -> Option<u32> {
        let entry = self.observer.cache().get(key);
        if !entry.is_success() {
            return None;
        }
        let total_count = entry.data?.total_count;

        let mut state = self.state.lock();
        if page_key(state.current_page) != *key {
            return None;
        }
        state.set_total_count(total_count)
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }
}

impl<S: PageSource + ?Sized> std::fmt::Debug for PaginationSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationSession")
            .field("state", &*self.state.lock())
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}
