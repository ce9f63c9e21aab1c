//! Incremental loader
//!
//! `Ready -> FetchingNext -> Ready ... -> Exhausted`. Each page runs
//! through the query cache under its own key; the loader only appends, it
//! never reorders or deduplicates pages.

use super::types::{InfiniteState, LoaderStatus};
use crate::api::PageSource;
use crate::error::Error;
use crate::query::{QueryCache, QueryKey, QueryOptions};
use crate::types::{Page, Post};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Cache key of loader page `cursor`
pub fn infinite_key(cursor: u32) -> QueryKey {
    infinite_prefix().with(cursor)
}

fn infinite_prefix() -> QueryKey {
    QueryKey::new("posts").with("infinite")
}

/// Loads pages one after another for an infinite-scroll view
pub struct InfiniteLoader<S: PageSource + ?Sized> {
    source: Arc<S>,
    cache: Arc<QueryCache<Page>>,
    state: Mutex<InfiniteState>,
    updates: watch::Sender<InfiniteState>,
}

impl<S: PageSource + ?Sized> InfiniteLoader<S> {
    /// Create a loader with the cursor on page 1; nothing is fetched yet
    pub fn new(cache: Arc<QueryCache<Page>>, source: Arc<S>, page_size: u32) -> Self {
        let state = InfiniteState::new(page_size);
        let (updates, _) = watch::channel(state.clone());
        Self {
            source,
            cache,
            state: Mutex::new(state),
            updates,
        }
    }

    pub fn state(&self) -> InfiniteState {
        self.state.lock().clone()
    }

    pub fn status(&self) -> LoaderStatus {
        self.state.lock().status
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more()
    }

    /// Posts loaded so far, in order
    pub fn items(&self) -> Vec<Post> {
        self.state.lock().items().cloned().collect()
    }

    /// Receive the state after every transition
    pub fn subscribe(&self) -> watch::Receiver<InfiniteState> {
        self.updates.subscribe()
    }

    /// Fetch the page under the cursor and append it
    ///
    /// Returns false without fetching while another page is loading or
    /// once the loader is exhausted. A failed page leaves the cursor where
    /// it was, so calling again retries it.
    pub async fn fetch_next(&self) -> bool {
        let (cursor, page_size, epoch) = {
            let mut state = self.state.lock();
            match state.status {
                LoaderStatus::FetchingNext => {
                    debug!("Already fetching, ignoring fetch_next");
                    return false;
                }
                LoaderStatus::Exhausted => return false,
                LoaderStatus::Ready => {}
            }
            let Some(cursor) = state.next_cursor else {
                state.status = LoaderStatus::Exhausted;
                return false;
            };
            state.status = LoaderStatus::FetchingNext;
            (cursor, state.page_size, state.epoch)
        };
        let _guard = FetchGuard {
            loader: self,
            epoch,
        };
        self.publish();

        let key = infinite_key(cursor);
        let source = Arc::clone(&self.source);
        let entry = self
            .cache
            .run(
                &key,
                move || async move { source.fetch_page(cursor, page_size).await },
                &QueryOptions::default(),
            )
            .await;

        {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                debug!("Loader was reset, dropping page {}", cursor);
                return true;
            }

            let loaded = entry.is_success();
            match entry.data.filter(|_| loaded) {
                Some(page) => {
                    debug!("Appended page {} ({} posts)", cursor, page.len());
                    state.append(cursor, page);
                }
                None => {
                    let error = entry
                        .error
                        .unwrap_or_else(|| Error::Other(format!("page {cursor} was cancelled")));
                    state.fail(error);
                }
            }
        }

        self.publish();
        true
    }

    /// Near-end signal from the renderer
    ///
    /// Fires at most one fetch per signal burst: signals arriving while a
    /// page is loading, or after the last page, are dropped.
    pub async fn on_near_end(&self) -> bool {
        if self.status() != LoaderStatus::Ready {
            debug!("Near-end signal ignored ({:?})", self.status());
            return false;
        }
        self.fetch_next().await
    }

    /// Drop every loaded page and start over at page 1
    ///
    /// A page still in flight is discarded when it lands.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            let epoch = state.epoch + 1;
            let page_size = state.page_size;
            *state = InfiniteState {
                epoch,
                ..InfiniteState::new(page_size)
            };
        }
        self.cache.invalidate_prefix(&infinite_prefix());
        for key in self.cache.keys() {
            if key.starts_with(&infinite_prefix()) {
                self.cache.cancel(&key);
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let state = self.state();
        self.updates.send_replace(state);
    }
}

/// Puts the loader back to `Ready` if a `fetch_next` is dropped mid-flight
///
/// A completed fetch has already left `FetchingNext`, so dropping the guard
/// then changes nothing. The page keeps loading in the cache and the next
/// signal picks it up.
struct FetchGuard<'a, S: PageSource + ?Sized> {
    loader: &'a InfiniteLoader<S>,
    epoch: u64,
}

impl<S: PageSource + ?Sized> Drop for FetchGuard<'_, S> {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.loader.state.lock();
            let abandoned =
                state.epoch == self.epoch && state.status == LoaderStatus::FetchingNext;
            if abandoned {
                state.status = LoaderStatus::Ready;
            }
            abandoned
        };
        if abandoned {
            debug!("fetch_next dropped, loader back to Ready");
            self.loader.publish();
        }
    }
}

impl<S: PageSource + ?Sized> std::fmt::Debug for InfiniteLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InfiniteLoader")
            .field("pages", &state.pages.len())
            .field("next_cursor", &state.next_cursor)
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}
