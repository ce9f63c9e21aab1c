//! Query observer
//!
//! Follows one logical query whose key changes over time (a page number,
//! a filter). Switching keys cancels interest in the old key's fetch and,
//! with `keep_previous_on_key_change`, keeps the last data on screen until
//! the new key has its own.

use super::cache::QueryCache;
use super::key::QueryKey;
use super::types::{CacheEntry, QueryOptions, QueryStatus};
use crate::error::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

struct ObserverState<T> {
    key: QueryKey,
    previous_data: Option<T>,
}

/// A view's handle on one query
pub struct QueryObserver<T> {
    cache: Arc<QueryCache<T>>,
    options: QueryOptions,
    state: Mutex<ObserverState<T>>,
}

impl<T> QueryObserver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Observe `key` in `cache`
    pub fn new(cache: Arc<QueryCache<T>>, key: QueryKey, options: QueryOptions) -> Self {
        Self {
            cache,
            options,
            state: Mutex::new(ObserverState {
                key,
                previous_data: None,
            }),
        }
    }

    /// Key currently observed
    pub fn key(&self) -> QueryKey {
        self.state.lock().key.clone()
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<QueryCache<T>> {
        &self.cache
    }

    /// Switch to `key`, returning false if it is already observed
    pub fn set_key(&self, key: QueryKey) -> bool {
        let old = {
            let mut state = self.state.lock();
            if state.key == key {
                return false;
            }
            if self.options.keep_previous_on_key_change {
                if let Some(data) = self.cache.peek(&state.key).and_then(|e| e.data) {
                    state.previous_data = Some(data);
                }
            }
            std::mem::replace(&mut state.key, key)
        };

        debug!("Observer moved off {}", old);
        self.cache.cancel(&old);
        true
    }

    /// Run the observed key
    pub async fn run<F, Fut>(&self, producer: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = self.key();
        self.run_for(&key, producer).await
    }

    /// Run `key` and report whatever key is observed once it settles
    ///
    /// A caller that switched to `key` just before uses this so the
    /// producer and the key it fetches can never disagree.
    pub async fn run_for<F, Fut>(&self, key: &QueryKey, producer: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.cache.run(key, producer, &self.options).await;
        self.current()
    }

    /// Force a fetch of the observed key
    pub async fn refetch<F, Fut>(&self, producer: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = self.key();
        self.cache.refetch(&key, producer).await;
        self.current()
    }

    /// Snapshot of the observed key
    ///
    /// While the key has no data and is idle or loading, previous data is
    /// reported when keep-previous is on. An error on the new key wins over
    /// previous data.
    pub fn current(&self) -> CacheEntry<T> {
        let state = self.state.lock();
        let entry = self.cache.get(&state.key);

        let placeholder_allowed = self.options.keep_previous_on_key_change
            && entry.data.is_none()
            && matches!(entry.status, QueryStatus::Idle | QueryStatus::Loading);

        match (&state.previous_data, placeholder_allowed) {
            (Some(previous), true) => entry.with_previous_data(previous.clone()),
            _ => entry,
        }
    }

    /// Stop observing: cancels interest in the observed key's fetch
    pub fn close(&self) {
        self.cache.cancel(&self.key());
    }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", &self.state.lock().key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
