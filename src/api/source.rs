//! Page source trait

use crate::error::Result;
use crate::types::Page;
use async_trait::async_trait;

/// Anything that can serve numbered pages of posts
///
/// Sessions fetch through this seam so they stay independent of HTTP.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Fetch page `page` (1-based) holding up to `page_size` posts
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page>;
}
