//! In-memory page source for unit tests

use crate::api::PageSource;
use crate::error::{Error, Result};
use crate::types::{Page, Post};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

/// Serves posts `1..=total` and records every page requested
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    total: AtomicU64,
    calls: Mutex<Vec<u32>>,
    failing: Mutex<HashSet<u32>>,
    gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
}

impl FakeSource {
    pub(crate) fn new(total: u64) -> Self {
        Self {
            total: AtomicU64::new(total),
            ..Self::default()
        }
    }

    /// Pages requested so far, in order
    pub(crate) fn calls(&self) -> Vec<u32> {
        self.calls.lock().clone()
    }

    pub(crate) fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    /// Make fetches of `page` fail until `heal`
    pub(crate) fn fail(&self, page: u32) {
        self.failing.lock().insert(page);
    }

    pub(crate) fn heal(&self, page: u32) {
        self.failing.lock().remove(&page);
    }

    /// Hold the next fetch of `page` until the returned sender fires
    pub(crate) fn gate(&self, page: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(page, rx);
        tx
    }
}

pub(crate) fn post(id: u64) -> Post {
    Post {
        id,
        title: format!("post {id}"),
        body: format!("body of post {id}"),
        user_id: (id - 1) / 10 + 1,
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page> {
        self.calls.lock().push(page);

        let gate = self.gates.lock().remove(&page);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.failing.lock().contains(&page) {
            return Err(Error::http_status(500, format!("page {page} failed")));
        }

        let total = self.total.load(Ordering::SeqCst);
        let start = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let end = (start + u64::from(page_size)).min(total);
        let items = (start + 1..=end).map(post).collect();
        Ok(Page::new(items, total))
    }
}
