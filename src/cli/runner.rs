//! CLI runner - executes commands
//!
//! Stands in for the view renderer: drives one view through its intents
//! and prints every snapshot as a JSON message.

use crate::api::{create_user_mutation, PostsApi, PostsQuery};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::FetchGateway;
use crate::infinite::InfiniteLoader;
use crate::pagination::{PaginationSession, PaginationSnapshot};
use crate::query::{CacheEntry, QueryCache};
use crate::types::{NewPost, Page, Post};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let gateway = FetchGateway::with_config(config.gateway_config())?;
        let api = Arc::new(PostsApi::new(gateway));
        info!("Using {}", config.base_url);

        let started = Instant::now();
        let result = match &self.cli.command {
            Commands::Posts => self.posts(api).await,
            Commands::Mutate {
                title,
                body,
                user_id,
            } => self.mutate(api, NewPost::new(title, body, *user_id)).await,
            Commands::Paginate { pages, go_to } => {
                self.paginate(api, config.page_size, *pages, *go_to).await
            }
            Commands::Infinite { max_pages } => {
                self.infinite(api, config.page_size, *max_pages).await
            }
        };
        info!("Finished in {}ms", started.elapsed().as_millis());
        result
    }

    /// Config file, then flag overrides
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match self.cli.config {
            Some(ref path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(ref base_url) = self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(page_size) = self.cli.page_size {
            config.page_size = page_size;
        }
        config.validate()?;
        Ok(config)
    }

    async fn posts(&self, api: Arc<PostsApi>) -> Result<()> {
        let query = PostsQuery::new(Arc::new(QueryCache::new()), api);

        let mounted = query.run().await;
        self.output_message(&query_message("mounted", &mounted));

        let fetched = query.refetch().await;
        self.output_message(&query_message("refetched", &fetched));
        check_entry(&fetched)
    }

    async fn mutate(&self, api: Arc<PostsApi>, payload: NewPost) -> Result<()> {
        let mutation = create_user_mutation(api);
        let state = mutation.mutate(payload).await;

        self.output_message(&json!({
            "type": "MUTATION",
            "status": format!("{:?}", state.status).to_uppercase(),
            "variables": state.variables,
            "data": state.data,
            "error": state.error.as_ref().map(ToString::to_string),
        }));

        match state.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn paginate(
        &self,
        api: Arc<PostsApi>,
        page_size: u32,
        pages: u32,
        go_to: Option<u32>,
    ) -> Result<()> {
        let session = PaginationSession::new(Arc::new(QueryCache::new()), api, page_size);

        let entry = session.load().await;
        self.output_message(&page_message(&session.snapshot()));
        check_entry(&entry)?;

        for _ in 1..pages {
            if !session.next().await {
                info!("Reached the last page");
                break;
            }
            self.output_message(&page_message(&session.snapshot()));
            check_entry(&session.current())?;
        }

        if let Some(page) = go_to {
            if !session.go_to(page).await {
                return Err(Error::Other(format!(
                    "page {page} is outside 1..={}",
                    session.state().total_pages()
                )));
            }
            self.output_message(&page_message(&session.snapshot()));
            check_entry(&session.current())?;
        }
        Ok(())
    }

    async fn infinite(
        &self,
        api: Arc<PostsApi>,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Result<()> {
        let loader = InfiniteLoader::new(Arc::new(QueryCache::new()), api, page_size);
        let limit = max_pages.unwrap_or(u32::MAX);

        let mut loaded = 0;
        while loaded < limit && loader.on_near_end().await {
            let state = loader.state();
            if let Some(e) = state.error {
                return Err(e);
            }
            loaded += 1;

            let last = state.pages.last().map(|p| p.page_param);
            self.output_message(&json!({
                "type": "INFINITE",
                "page": last,
                "items": state.item_count(),
                "total": state.total_count(),
                "has_more": state.has_more(),
            }));
        }
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn check_entry<T>(entry: &CacheEntry<T>) -> Result<()> {
    match entry.error {
        Some(ref e) if entry.is_error() => Err(e.clone()),
        _ => Ok(()),
    }
}

fn query_message(stage: &str, entry: &CacheEntry<Vec<Post>>) -> Value {
    json!({
        "type": "QUERY",
        "stage": stage,
        "key": entry.key.to_string(),
        "status": format!("{:?}", entry.status).to_uppercase(),
        "count": entry.data.as_ref().map(Vec::len),
        "first": entry.data.as_ref().and_then(|posts| posts.first()).map(|p| &p.title),
    })
}

fn page_message(snapshot: &PaginationSnapshot) -> Value {
    let ids: Vec<u64> = snapshot
        .entry
        .data
        .as_ref()
        .map(|page: &Page| page.items.iter().map(|p| p.id).collect())
        .unwrap_or_default();

    json!({
        "type": "PAGE",
        "page": snapshot.state.current_page,
        "total_pages": snapshot.total_pages(),
        "total": snapshot.state.total_count,
        "status": format!("{:?}", snapshot.entry.status).to_uppercase(),
        "ids": ids,
    })
}
