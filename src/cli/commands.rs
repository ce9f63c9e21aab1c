//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query cache and pagination demo against the posts test API
#[derive(Parser, Debug)]
#[command(name = "postquery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the page size
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mount the on-demand posts query, then refetch it
    Posts,

    /// Create a record through the mutation
    Mutate {
        /// Title of the new post
        #[arg(long, default_value = "foo")]
        title: String,

        /// Body of the new post
        #[arg(long, default_value = "bar")]
        body: String,

        /// Owning user id
        #[arg(long, default_value = "1")]
        user_id: u64,
    },

    /// Walk the paginated view page by page
    Paginate {
        /// Number of pages to visit
        #[arg(long, default_value = "3")]
        pages: u32,

        /// Jump to this page after walking
        #[arg(long)]
        go_to: Option<u32>,
    },

    /// Scroll the infinite view until exhausted
    Infinite {
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
