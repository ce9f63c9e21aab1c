//! CLI module
//!
//! Terminal stand-in for the view renderer.
//!
//! # Commands
//!
//! - `posts` - mount the on-demand query, then refetch it
//! - `mutate` - create a record through the mutation
//! - `paginate` - walk the page cursor with keep-previous data
//! - `infinite` - scroll the incremental loader until exhausted

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
