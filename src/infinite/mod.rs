//! Infinite loading module
//!
//! Accumulates successive pages into one ordered sequence for an
//! infinite-scroll view.
//!
//! # Overview
//!
//! - `InfiniteLoader` - fetches the page under the cursor, appends it and
//!   advances the cursor until it runs off the last page
//! - `InfiniteState` - pages in arrival order plus the cursor
//!
//! The view renderer calls `on_near_end` when the last rendered item comes
//! into view; repeated signals while a page is loading are ignored.

mod loader;
mod types;

pub use loader::{infinite_key, InfiniteLoader};
pub use types::{InfinitePage, InfiniteState, LoaderStatus};
