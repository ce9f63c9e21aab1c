// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # postquery
//!
//! Client-side data fetching patterns against the posts test API: an
//! on-demand query, a mutation, an infinite-scroll loader and a paginated
//! view that keeps the previous page on screen while the next one loads.
//!
//! ## Features
//!
//! - **Query Cache**: keyed entries, one in-flight fetch per key, late
//!   responses discarded by request id
//! - **Keep Previous Data**: observers keep the last page visible across
//!   key changes
//! - **Page Cursor**: guarded `next` / `prev` / `go_to` with total-page
//!   arithmetic from `x-total-count`
//! - **Incremental Loader**: near-end signals append pages until exhausted
//! - **Mutations**: `mutate` / `reset` with superseded results dropped
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use postquery::{FetchGateway, PaginationSession, PostsApi, QueryCache, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let api = Arc::new(PostsApi::new(FetchGateway::new()?));
//!     let session = PaginationSession::new(Arc::new(QueryCache::new()), api, 10);
//!
//!     session.load().await;
//!     let mut updates = session.subscribe();
//!     session.next().await;
//!     println!("page {}", updates.borrow_and_update().state.current_page);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 View renderer (subscribes)                   │
//! │   next / prev / go_to / refetch / on_near_end / mutate       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────────┬──────────┴─────────┬──────────────────────┐
//! │   Pagination     │     Infinite       │  PostsQuery/Mutation │
//! │   Session        │     Loader         │                      │
//! └──────────────────┴──────────┬─────────┴──────────────────────┘
//!                               │
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Query cache: entries, in-flight registry, request ids      │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Posts API (PageSource) → Fetch gateway (reqwest, governor) │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Fetch gateway with optional rate limiting
pub mod http;

/// Posts API, page source seam and ready-made queries
pub mod api;

/// Query cache, keys and observers
pub mod query;

/// Mutation state machine
pub mod mutation;

/// Page cursor and paginated sessions
pub mod pagination;

/// Incremental loader for infinite scroll
pub mod infinite;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use api::{create_user_mutation, PageSource, PostsApi, PostsQuery};
pub use config::ClientConfig;
pub use http::{FetchGateway, FetchGatewayConfig, FetchResponse};
pub use infinite::{InfiniteLoader, InfiniteState, LoaderStatus};
pub use mutation::{Mutation, MutationState, MutationStatus};
pub use pagination::{PaginationSession, PaginationSnapshot, PaginationState};
pub use query::{CacheEntry, QueryCache, QueryKey, QueryObserver, QueryOptions, QueryStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
