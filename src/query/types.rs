//! Cache entry and query option types

use super::key::QueryKey;
use crate::error::Error;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Lifecycle of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    /// Never fetched
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// Last fetch succeeded
    Success,
    /// Last fetch failed
    Error,
}

/// Snapshot of one cache entry
///
/// Only the cache mutates entries; everything handed out is a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Key this entry lives under
    pub key: QueryKey,
    pub status: QueryStatus,
    /// Last known good value; kept across failed refetches
    pub data: Option<T>,
    /// Error of the last fetch, cleared on success
    pub error: Option<Error>,
    /// When `data` was last written by a fetch
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// A request for this key is in flight
    pub is_fetching: bool,
    /// `data` belongs to a previous key, shown while this one loads
    pub is_previous_data: bool,
    /// Marked stale; the next run fetches again
    pub is_invalidated: bool,
}

impl<T> CacheEntry<T> {
    /// Create an idle, empty entry
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_fetched_at: None,
            is_fetching: false,
            is_previous_data: false,
            is_invalidated: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Report `data` from a previous key in place of an empty entry
    #[must_use]
    pub fn with_previous_data(mut self, data: T) -> Self {
        self.status = QueryStatus::Success;
        self.data = Some(data);
        self.is_previous_data = true;
        self
    }
}

/// Per-call query behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fetch automatically on `run`; `refetch` ignores this
    pub enabled: bool,
    /// Show the previous key's data while a new key loads
    pub keep_previous_on_key_change: bool,
    /// Age after which cached data is refetched; `None` keeps it fresh forever
    pub stale_time: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            keep_previous_on_key_change: false,
            stale_time: None,
        }
    }
}

impl QueryOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Only fetch on explicit refetch
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Keep previous data visible across key changes
    #[must_use]
    pub fn keep_previous(mut self) -> Self {
        self.keep_previous_on_key_change = true;
        self
    }

    /// Set the stale time
    #[must_use]
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }
}
