//! HTTP-backed posts API

use super::source::PageSource;
use crate::error::Result;
use crate::http::{FetchGateway, FetchResponse};
use crate::types::{JsonValue, NewPost, Page, Post};
use async_trait::async_trait;
use tracing::debug;

/// Typed client for the posts test API
#[derive(Debug)]
pub struct PostsApi {
    gateway: FetchGateway,
}

impl PostsApi {
    /// Create an API client over `gateway`
    pub fn new(gateway: FetchGateway) -> Self {
        Self { gateway }
    }

    /// Underlying gateway
    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    /// Fetch one page of posts
    ///
    /// Without a total-count header the total falls back to the number of
    /// posts known to exist up to and including this page.
    pub async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page> {
        let resource = format!("posts?_page={page}&_limit={page_size}");
        let response = self.gateway.get(&resource).await?.error_for_status()?;
        let items: Vec<Post> = response.json()?;

        let total_count = response.total_count.unwrap_or_else(|| {
            let before = u64::from(page.saturating_sub(1)) * u64::from(page_size);
            before + items.len() as u64
        });

        debug!(
            "Fetched page {} ({} posts, total {})",
            page,
            items.len(),
            total_count
        );
        Ok(Page::new(items, total_count))
    }

    /// Fetch every post
    pub async fn fetch_all(&self) -> Result<Vec<Post>> {
        let response = self.gateway.get("posts").await?.error_for_status()?;
        response.json()
    }

    /// Create a record from `payload`, returning the server's echo
    pub async fn create_user(&self, payload: &NewPost) -> Result<JsonValue> {
        let body = serde_json::to_value(payload)?;
        let response: FetchResponse = self
            .gateway
            .post("users", &body)
            .await?
            .error_for_status()?;
        Ok(response.body)
    }
}

#[async_trait]
impl PageSource for PostsApi {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page> {
        PostsApi::fetch_page(self, page, page_size).await
    }
}
