//! Query module
//!
//! Keyed cache of async results with request de-duplication.
//!
//! # Overview
//!
//! - `QueryKey` - ordered tuple of primitives addressing one entry
//! - `QueryCache` - owns entries and the per-key in-flight registry
//! - `QueryObserver` - one view's handle on a query whose key changes
//!
//! A cache handles one data type; views that share it share results.

mod cache;
mod key;
mod observer;
mod types;

pub use cache::QueryCache;
pub use key::{KeyPart, QueryKey};
pub use observer::QueryObserver;
pub use types::{CacheEntry, QueryOptions, QueryStatus};

#[cfg(test)]
mod tests;
