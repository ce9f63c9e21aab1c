//! Posts API module
//!
//! Typed calls against the posts test API, built on the fetch gateway,
//! plus the ready-made queries and mutations the views use.
//!
//! # Endpoints
//!
//! - `GET /posts?_page={n}&_limit={size}` - one page, total in `x-total-count`
//! - `GET /posts` - every post
//! - `POST /users` - create, echoes the payload back with an id

mod posts;
mod queries;
mod source;

pub use posts::PostsApi;
pub use queries::{create_user_mutation, posts_key, PostsQuery};
pub use source::PageSource;
