//! Tests for the query module

use super::*;
use crate::error::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready, task};

fn page_key(page: u32) -> QueryKey {
    QueryKey::new("posts").with(page)
}

/// A producer future that resolves when the test sends through `rx`
fn gated(rx: oneshot::Receiver<Result<String>>) -> impl Future<Output = Result<String>> + Send {
    async move {
        rx.await
            .unwrap_or_else(|_| Err(Error::network("sender dropped")))
    }
}

fn ready(value: &str) -> impl Future<Output = Result<String>> + Send {
    let value = value.to_string();
    async move { Ok(value) }
}

// ============================================================================
// QueryCache Tests
// ============================================================================

#[test]
fn test_get_creates_idle_entry() {
    let cache = QueryCache::<String>::new();
    assert!(cache.peek(&page_key(1)).is_none());

    let entry = cache.get(&page_key(1));
    assert_eq!(entry.status, QueryStatus::Idle);
    assert_eq!(entry.key, page_key(1));
    assert!(entry.data.is_none());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_run_success_populates_entry() {
    let cache = QueryCache::<String>::new();
    let entry = cache
        .run(&page_key(1), || ready("page one"), &QueryOptions::default())
        .await;

    assert_eq!(entry.status, QueryStatus::Success);
    assert_eq!(entry.data.as_deref(), Some("page one"));
    assert!(entry.error.is_none());
    assert!(entry.last_fetched_at.is_some());
    assert!(!entry.is_fetching);
}

#[tokio::test]
async fn test_fetching_one_key_leaves_others_untouched() {
    let cache = QueryCache::<String>::new();
    let before = cache.get(&page_key(2));

    cache
        .run(&page_key(1), || ready("one"), &QueryOptions::default())
        .await;
    cache
        .run(
            &page_key(3),
            || async { Err::<String, _>(Error::http_status(500, "")) },
            &QueryOptions::default(),
        )
        .await;

    assert_eq!(cache.get(&page_key(2)), before);
    assert!(cache.get(&page_key(3)).is_error());
    assert!(cache.get(&page_key(1)).is_success());
}

#[tokio::test]
async fn test_concurrent_runs_issue_one_fetch() {
    let cache = QueryCache::<String>::new();
    let calls = AtomicUsize::new(0);
    let (tx, rx) = oneshot::channel();
    let options = QueryOptions::default();
    let key = QueryKey::new("posts");

    let (a, b, ()) = tokio::join!(
        cache.run(
            &key,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                gated(rx)
            },
            &options,
        ),
        cache.run(
            &key,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                ready("second producer")
            },
            &options,
        ),
        async {
            tx.send(Ok("shared".to_string())).unwrap();
        }
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.data.as_deref(), Some("shared"));
    assert_eq!(b.data.as_deref(), Some("shared"));
}

#[tokio::test]
async fn test_entry_is_loading_while_in_flight() {
    let cache = QueryCache::<String>::new();
    let (tx, rx) = oneshot::channel();
    let key = page_key(1);
    let options = QueryOptions::default();

    let mut run = task::spawn(cache.run(&key, move || gated(rx), &options));
    assert_pending!(run.poll());

    let entry = cache.get(&key);
    assert!(entry.is_loading());
    assert!(entry.is_fetching);
    assert!(cache.is_fetching(&key));

    tx.send(Ok("done".to_string())).unwrap();
    let entry = assert_ready!(run.poll());
    assert!(entry.is_success());
    assert!(!cache.is_fetching(&key));
}

#[tokio::test]
async fn test_fetch_settles_after_every_caller_is_dropped() {
    let cache = QueryCache::<String>::new();
    let (tx, rx) = oneshot::channel();
    let key = page_key(1);

    let dropped = tokio::time::timeout(
        Duration::from_millis(20),
        cache.run(&key, move || gated(rx), &QueryOptions::default()),
    )
    .await;
    assert!(dropped.is_err());
    assert!(cache.get(&key).is_loading());

    tx.send(Ok("landed".to_string())).unwrap();
    tokio::time::timeout(Duration::from_secs(1), async {
        while cache.is_fetching(&key) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let entry = cache.get(&key);
    assert!(entry.is_success());
    assert!(!entry.is_fetching);
    assert_eq!(entry.data.as_deref(), Some("landed"));
}

#[tokio::test]
async fn test_disabled_run_skips_fetch_and_refetch_forces_it() {
    let cache = QueryCache::<String>::new();
    let calls = AtomicUsize::new(0);
    let key = QueryKey::new("posts");
    let options = QueryOptions::new().disabled();

    let entry = cache
        .run(
            &key,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                ready("never")
            },
            &options,
        )
        .await;
    assert!(entry.is_idle());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let entry = cache
        .refetch(&key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            ready("all posts")
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.data.as_deref(), Some("all posts"));
}

#[tokio::test]
async fn test_fresh_entry_is_not_refetched_until_invalidated() {
    let cache = QueryCache::<String>::new();
    let calls = AtomicUsize::new(0);
    let key = page_key(1);
    let options = QueryOptions::default();
    let producer = || {
        calls.fetch_add(1, Ordering::SeqCst);
        ready("page")
    };

    cache.run(&key, producer, &options).await;
    cache.run(&key, producer, &options).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(cache.invalidate(&key));
    assert!(cache.get(&key).is_invalidated);
    cache.run(&key, producer, &options).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache.get(&key).is_invalidated);
}

#[tokio::test]
async fn test_zero_stale_time_always_refetches() {
    let cache = QueryCache::<String>::new();
    let calls = AtomicUsize::new(0);
    let key = page_key(1);
    let options = QueryOptions::new().stale_time(Duration::ZERO);
    let producer = || {
        calls.fetch_add(1, Ordering::SeqCst);
        ready("page")
    };

    cache.run(&key, producer, &options).await;
    cache.run(&key, producer, &options).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_error_keeps_last_good_data() {
    let cache = QueryCache::<String>::new();
    let key = page_key(1);

    cache.run(&key, || ready("good"), &QueryOptions::default()).await;
    let entry = cache
        .refetch(&key, || async { Err::<String, _>(Error::network("offline")) })
        .await;

    assert_eq!(entry.status, QueryStatus::Error);
    assert_eq!(entry.data.as_deref(), Some("good"));
    assert_eq!(entry.error, Some(Error::network("offline")));

    let entry = cache.refetch(&key, || ready("better")).await;
    assert!(entry.is_success());
    assert!(entry.error.is_none());
}

#[tokio::test]
async fn test_refetch_joins_in_flight_request() {
    let cache = QueryCache::<String>::new();
    let calls = AtomicUsize::new(0);
    let (tx, rx) = oneshot::channel();
    let key = page_key(1);
    let options = QueryOptions::default();

    let mut run = task::spawn(cache.run(
        &key,
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            gated(rx)
        },
        &options,
    ));
    assert_pending!(run.poll());

    let mut refetch = task::spawn(cache.refetch(&key, || {
        calls.fetch_add(1, Ordering::SeqCst);
        ready("duplicate")
    }));
    assert_pending!(refetch.poll());

    tx.send(Ok("original".to_string())).unwrap();
    let entry = assert_ready!(refetch.poll());
    assert_eq!(entry.data.as_deref(), Some("original"));
    assert_ready!(run.poll());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_request_result_is_discarded() {
    let cache = QueryCache::<String>::new();
    let (tx, rx) = oneshot::channel();
    let key = page_key(1);
    let options = QueryOptions::default();

    let mut run = task::spawn(cache.run(&key, move || gated(rx), &options));
    assert_pending!(run.poll());

    assert!(cache.cancel(&key));
    assert!(cache.get(&key).is_idle());
    assert!(!cache.cancel(&key));

    tx.send(Ok("late".to_string())).unwrap();
    let entry = assert_ready!(run.poll());
    assert!(entry.is_idle());
    assert!(entry.data.is_none());
}

#[tokio::test]
async fn test_last_request_wins_for_same_key() {
    let cache = QueryCache::<String>::new();
    let (tx_old, rx_old) = oneshot::channel();
    let (tx_new, rx_new) = oneshot::channel();
    let key = page_key(1);
    let options = QueryOptions::default();

    let mut old = task::spawn(cache.run(&key, move || gated(rx_old), &options));
    assert_pending!(old.poll());
    cache.cancel(&key);

    let mut new = task::spawn(cache.run(&key, move || gated(rx_new), &options));
    assert_pending!(new.poll());

    tx_old.send(Ok("superseded".to_string())).unwrap();
    let entry = assert_ready!(old.poll());
    assert!(entry.is_loading());
    assert!(entry.data.is_none());

    tx_new.send(Ok("latest".to_string())).unwrap();
    let entry = assert_ready!(new.poll());
    assert_eq!(entry.data.as_deref(), Some("latest"));
}

#[tokio::test]
async fn test_cancel_restores_previous_success() {
    let cache = QueryCache::<String>::new();
    let key = page_key(1);
    cache.run(&key, || ready("cached"), &QueryOptions::default()).await;

    let (_tx, rx) = oneshot::channel();
    let mut refetch = task::spawn(cache.refetch(&key, move || gated(rx)));
    assert_pending!(refetch.poll());
    assert!(cache.get(&key).is_loading());

    cache.cancel(&key);
    let entry = cache.get(&key);
    assert!(entry.is_success());
    assert_eq!(entry.data.as_deref(), Some("cached"));
}

#[tokio::test]
async fn test_set_data_supersedes_in_flight() {
    let cache = QueryCache::<String>::new();
    let (tx, rx) = oneshot::channel();
    let key = QueryKey::new("posts");
    let options = QueryOptions::default();

    let mut run = task::spawn(cache.run(&key, move || gated(rx), &options));
    assert_pending!(run.poll());

    cache.set_data(&key, "written".to_string());
    tx.send(Ok("fetched".to_string())).unwrap();

    let entry = assert_ready!(run.poll());
    assert_eq!(entry.data.as_deref(), Some("written"));
}

#[tokio::test]
async fn test_invalidate_prefix() {
    let cache = QueryCache::<String>::new();
    let options = QueryOptions::default();
    let infinite = QueryKey::new("posts").with("infinite");

    cache.run(&infinite.clone().with(1u32), || ready("a"), &options).await;
    cache.run(&infinite.clone().with(2u32), || ready("b"), &options).await;
    cache.run(&page_key(1), || ready("c"), &options).await;

    assert_eq!(cache.invalidate_prefix(&infinite), 2);
    assert!(!cache.get(&page_key(1)).is_invalidated);
    assert!(!cache.invalidate(&QueryKey::new("users")));
}

// ============================================================================
// QueryObserver Tests
// ============================================================================

#[tokio::test]
async fn test_stale_page_response_does_not_overwrite_new_page() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache.clone(), page_key(1), QueryOptions::new().keep_previous());
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();

    let mut first = task::spawn(observer.run(move || gated(rx1)));
    assert_pending!(first.poll());

    assert!(observer.set_key(page_key(2)));
    let mut second = task::spawn(observer.run(move || gated(rx2)));
    assert_pending!(second.poll());

    tx1.send(Ok("page one".to_string())).unwrap();
    let seen = assert_ready!(first.poll());
    assert_eq!(seen.key, page_key(2));
    assert!(seen.data.is_none());

    let page_two = cache.get(&page_key(2));
    assert!(page_two.is_loading());
    assert!(page_two.data.is_none());
    assert!(cache.get(&page_key(1)).data.is_none());

    tx2.send(Ok("page two".to_string())).unwrap();
    let seen = assert_ready!(second.poll());
    assert_eq!(seen.data.as_deref(), Some("page two"));
    assert!(!seen.is_previous_data);
}

#[tokio::test]
async fn test_keep_previous_data_while_next_key_loads() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache.clone(), page_key(1), QueryOptions::new().keep_previous());

    observer.run(|| ready("page one")).await;
    observer.set_key(page_key(2));

    let (tx, rx) = oneshot::channel();
    let mut run = task::spawn(observer.run(move || gated(rx)));
    assert_pending!(run.poll());

    let shown = observer.current();
    assert_eq!(shown.key, page_key(2));
    assert_eq!(shown.status, QueryStatus::Success);
    assert_eq!(shown.data.as_deref(), Some("page one"));
    assert!(shown.is_previous_data);
    assert!(shown.is_fetching);

    // the cache itself never stores the placeholder
    assert!(cache.get(&page_key(2)).data.is_none());

    tx.send(Ok("page two".to_string())).unwrap();
    let shown = assert_ready!(run.poll());
    assert_eq!(shown.data.as_deref(), Some("page two"));
    assert!(!shown.is_previous_data);
}

#[tokio::test]
async fn test_error_on_new_key_wins_over_previous_data() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache, page_key(1), QueryOptions::new().keep_previous());

    observer.run(|| ready("page one")).await;
    observer.set_key(page_key(2));
    let shown = observer
        .run(|| async { Err::<String, _>(Error::http_status(503, "busy")) })
        .await;

    assert_eq!(shown.status, QueryStatus::Error);
    assert!(shown.data.is_none());
    assert!(!shown.is_previous_data);
    assert_eq!(shown.error.and_then(|e| e.status()), Some(503));
}

#[tokio::test]
async fn test_without_keep_previous_new_key_shows_loading() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache, page_key(1), QueryOptions::default());

    observer.run(|| ready("page one")).await;
    observer.set_key(page_key(2));

    let (_tx, rx) = oneshot::channel();
    let mut run = task::spawn(observer.run(move || gated(rx)));
    assert_pending!(run.poll());

    let shown = observer.current();
    assert!(shown.is_loading());
    assert!(shown.data.is_none());
}

#[tokio::test]
async fn test_returning_to_cached_key_needs_no_fetch() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache, page_key(1), QueryOptions::new().keep_previous());
    let calls = AtomicUsize::new(0);

    observer.run(|| ready("page one")).await;
    observer.set_key(page_key(2));
    observer.run(|| ready("page two")).await;
    observer.set_key(page_key(1));

    let shown = observer
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            ready("refetched")
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(shown.data.as_deref(), Some("page one"));
    assert!(!shown.is_previous_data);
}

#[test]
fn test_set_key_same_key_is_noop() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache, page_key(1), QueryOptions::default());
    assert!(!observer.set_key(page_key(1)));
    assert_eq!(observer.key(), page_key(1));
}

#[tokio::test]
async fn test_close_cancels_interest() {
    let cache = Arc::new(QueryCache::<String>::new());
    let observer = QueryObserver::new(cache.clone(), page_key(1), QueryOptions::default());
    let (tx, rx) = oneshot::channel();

    let mut run = task::spawn(observer.run(move || gated(rx)));
    assert_pending!(run.poll());
    observer.close();

    tx.send(Ok("after unmount".to_string())).unwrap();
    assert_ready!(run.poll());
    assert!(cache.get(&page_key(1)).data.is_none());
}
