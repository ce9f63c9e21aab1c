//! Query cache
//!
//! Maps query keys to cache entries and keeps a registry of in-flight
//! fetches:
//! - At most one fetch per key runs at a time; later callers join it
//! - Every fetch carries a request id; a result is applied only while its
//!   id is still the key's in-flight id
//! - Cancelling a key drops interest in its fetch, so a late result is
//!   discarded instead of written
//! - Each fetch is driven by its own task, so it settles even when every
//!   caller awaiting it has been dropped

use super::key::QueryKey;
use super::types::{CacheEntry, QueryOptions, QueryStatus};
use crate::error::Result;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;
type Slots<T> = Arc<Mutex<HashMap<QueryKey, Slot<T>>>>;

struct InFlight<T> {
    request_id: u64,
    fetch: SharedFetch<T>,
    prior_status: QueryStatus,
}

struct Slot<T> {
    entry: CacheEntry<T>,
    in_flight: Option<InFlight<T>>,
    fetched_at: Option<Instant>,
}

impl<T> Slot<T> {
    fn new(key: QueryKey) -> Self {
        Self {
            entry: CacheEntry::new(key),
            in_flight: None,
            fetched_at: None,
        }
    }

    fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
        if self.entry.status != QueryStatus::Success || self.entry.is_invalidated {
            return false;
        }
        match (stale_time, self.fetched_at) {
            (None, _) => true,
            (Some(stale_time), Some(at)) => at.elapsed() < stale_time,
            (Some(_), None) => false,
        }
    }
}

/// Outcome of the locked part of `run`
enum Begin<T> {
    Ready(CacheEntry<T>),
    Await(u64, SharedFetch<T>),
}

/// Why a fetch is being considered
#[derive(Clone, Copy)]
enum Mode<'a> {
    Run(&'a QueryOptions),
    Refetch,
}

/// Keyed cache of query results
pub struct QueryCache<T> {
    slots: Slots<T>,
    next_request_id: AtomicU64,
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the entry for `key`, creating an idle one on first access
    pub fn get(&self, key: &QueryKey) -> CacheEntry<T> {
        let mut slots = self.slots.lock();
        slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone()))
            .entry
            .clone()
    }

    /// Snapshot of the entry for `key` without creating it
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.slots.lock().get(key).map(|slot| slot.entry.clone())
    }

    /// Fetch `key` unless it is disabled, fresh, or already in flight
    ///
    /// When a fetch for `key` is in flight the caller joins it and
    /// `producer` is never called. A new fetch is spawned onto the current
    /// tokio runtime.
    pub async fn run<F, Fut>(
        &self,
        key: &QueryKey,
        producer: F,
        options: &QueryOptions,
    ) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match self.begin(key, producer, Mode::Run(options)) {
            Begin::Ready(entry) => entry,
            Begin::Await(request_id, fetch) => self.complete(key, request_id, fetch).await,
        }
    }

    /// Fetch `key` regardless of `enabled` and freshness
    ///
    /// Joins the in-flight fetch if there is one.
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, producer: F) -> CacheEntry<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match self.begin(key, producer, Mode::Refetch) {
            Begin::Ready(entry) => entry,
            Begin::Await(request_id, fetch) => self.complete(key, request_id, fetch).await,
        }
    }

    /// Mark `key` stale so the next run fetches again
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(key) {
            Some(slot) => {
                slot.entry.is_invalidated = true;
                debug!("Invalidated {}", key);
                true
            }
            None => false,
        }
    }

    /// Mark every key under `prefix` stale, returning how many were marked
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let mut slots = self.slots.lock();
        let mut count = 0;
        for (key, slot) in slots.iter_mut() {
            if key.starts_with(prefix) {
                slot.entry.is_invalidated = true;
                count += 1;
            }
        }
        debug!("Invalidated {} entries under {}", count, prefix);
        count
    }

    /// Drop interest in the in-flight fetch of `key`
    ///
    /// The entry returns to its status from before the fetch and the late
    /// result, whenever it arrives, is discarded.
    pub fn cancel(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(key) else {
            return false;
        };
        match slot.in_flight.take() {
            Some(in_flight) => {
                slot.entry.status = in_flight.prior_status;
                slot.entry.is_fetching = false;
                debug!(
                    "Cancelled request {} for {}",
                    in_flight.request_id, key
                );
                true
            }
            None => false,
        }
    }

    /// Write data for `key` directly, as if a fetch had just succeeded
    ///
    /// Any in-flight fetch for `key` is superseded.
    pub fn set_data(&self, key: &QueryKey, data: T) {
        let mut slots = self.slots.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone()));
        slot.in_flight = None;
        store_success(slot, data);
    }

    /// Keys currently in the cache
    pub fn keys(&self) -> Vec<QueryKey> {
        self.slots.lock().keys().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True when no entry exists
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// True while a fetch for `key` is registered
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    fn begin<F, Fut>(&self, key: &QueryKey, producer: F, mode: Mode<'_>) -> Begin<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slots = self.slots.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone()));

        if let Some(ref in_flight) = slot.in_flight {
            debug!(
                "Joining in-flight request {} for {}",
                in_flight.request_id, key
            );
            return Begin::Await(in_flight.request_id, in_flight.fetch.clone());
        }

        if let Mode::Run(options) = mode {
            if !options.enabled {
                return Begin::Ready(slot.entry.clone());
            }
            if slot.is_fresh(options.stale_time) {
                debug!("Cache hit for {}", key);
                return Begin::Ready(slot.entry.clone());
            }
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let fetch = producer().boxed().shared();

        slot.in_flight = Some(InFlight {
            request_id,
            fetch: fetch.clone(),
            prior_status: slot.entry.status,
        });
        slot.entry.status = QueryStatus::Loading;
        slot.entry.is_fetching = true;

        debug!("Starting request {} for {}", request_id, key);
        tokio::spawn(drive(
            Arc::clone(&self.slots),
            key.clone(),
            request_id,
            fetch.clone(),
        ));
        Begin::Await(request_id, fetch)
    }

    async fn complete(&self, key: &QueryKey, request_id: u64, fetch: SharedFetch<T>) -> CacheEntry<T> {
        let result = fetch.await;
        settle(&self.slots, key, request_id, result);
        self.get(key)
    }
}

/// Run `fetch` to completion on its own task and settle it
async fn drive<T>(slots: Slots<T>, key: QueryKey, request_id: u64, fetch: SharedFetch<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let result = fetch.await;
    settle(&slots, &key, request_id, result);
}

/// Apply a result if `request_id` is still current for `key`
fn settle<T>(
    slots: &Mutex<HashMap<QueryKey, Slot<T>>>,
    key: &QueryKey,
    request_id: u64,
    result: Result<T>,
) -> bool {
    let mut slots = slots.lock();
    let Some(slot) = slots.get_mut(key) else {
        return false;
    };

    let current = slot.in_flight.as_ref().map(|f| f.request_id);
    if current != Some(request_id) {
        // already applied, cancelled, or superseded
        debug!("Ignoring response {} for {}", request_id, key);
        return false;
    }
    slot.in_flight = None;

    match result {
        Ok(data) => store_success(slot, data),
        Err(e) => {
            warn!("Request {} for {} failed: {}", request_id, key, e);
            slot.entry.status = QueryStatus::Error;
            slot.entry.error = Some(e);
            slot.entry.is_fetching = false;
        }
    }
    true
}

fn store_success<T>(slot: &mut Slot<T>, data: T) {
    slot.entry.status = QueryStatus::Success;
    slot.entry.data = Some(data);
    slot.entry.error = None;
    slot.entry.last_fetched_at = Some(Utc::now());
    slot.entry.is_fetching = false;
    slot.entry.is_invalidated = false;
    slot.fetched_at = Some(Instant::now());
}

impl<T> Default for QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for QueryCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("QueryCache")
            .field("entries", &slots.len())
            .field(
                "in_flight",
                &slots.values().filter(|s| s.in_flight.is_some()).count(),
            )
            .finish()
    }
}
