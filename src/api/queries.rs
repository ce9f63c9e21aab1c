//! Queries and mutations over the posts API

use super::posts::PostsApi;
use crate::mutation::Mutation;
use crate::query::{CacheEntry, QueryCache, QueryKey, QueryObserver, QueryOptions};
use crate::types::{JsonValue, NewPost, Post};
use std::sync::Arc;

/// Key of the full post list
pub fn posts_key() -> QueryKey {
    QueryKey::new("posts")
}

/// On-demand query for every post
///
/// Disabled: `run` leaves it idle and only `refetch` hits the network.
#[derive(Debug)]
pub struct PostsQuery {
    api: Arc<PostsApi>,
    observer: QueryObserver<Vec<Post>>,
}

impl PostsQuery {
    pub fn new(cache: Arc<QueryCache<Vec<Post>>>, api: Arc<PostsApi>) -> Self {
        Self {
            api,
            observer: QueryObserver::new(cache, posts_key(), QueryOptions::new().disabled()),
        }
    }

    /// Mount the query; does not fetch
    pub async fn run(&self) -> CacheEntry<Vec<Post>> {
        let api = Arc::clone(&self.api);
        self.observer
            .run(move || async move { api.fetch_all().await })
            .await
    }

    /// Fetch every post now
    pub async fn refetch(&self) -> CacheEntry<Vec<Post>> {
        let api = Arc::clone(&self.api);
        self.observer
            .refetch(move || async move { api.fetch_all().await })
            .await
    }

    pub fn current(&self) -> CacheEntry<Vec<Post>> {
        self.observer.current()
    }
}

/// Mutation posting a new record to `/users`
pub fn create_user_mutation(api: Arc<PostsApi>) -> Mutation<NewPost, JsonValue> {
    Mutation::new(move |payload: NewPost| {
        let api = Arc::clone(&api);
        async move { api.create_user(&payload).await }
    })
}
