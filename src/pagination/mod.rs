//! Pagination module
//!
//! Page-based navigation over the posts API.
//!
//! # Overview
//!
//! `PaginationSession` views one page at a time under the key
//! `["posts", page]`. Moving past either end is a guarded no-op, and the
//! previous page stays visible while the next one loads.

mod session;
mod types;

pub use session::{page_key, PaginationSession, PaginationSnapshot};
pub use types::{next_page_param, total_pages, PaginationState};
