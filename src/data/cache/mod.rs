//! Blog read cache
//!
//! A best-effort read-through / write-invalidate cache in front of the
//! blog tables. It is never authoritative:
//!
//! - Reads try the cache first; a miss, a backend error or an undecodable
//!   payload all fall through to the database.
//! - Only successful database reads populate the cache, with a fixed TTL.
//! - Blog mutations delete the affected keys afterwards. Invalidation is
//!   not atomic with the write, so a concurrent reader may repopulate a
//!   stale list during the scan; the window is bounded by the scan latency
//!   and, at worst, the TTL.
//!
//! Backend failures are logged and swallowed; no request fails because of
//! the cache.

pub mod keys;
mod memory;
mod redis_store;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

use crate::metrics::{
    CACHE_ERRORS_TOTAL, CACHE_HITS_TOTAL, CACHE_INVALIDATIONS_TOTAL, CACHE_MISSES_TOTAL,
};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Key-value store with TTL and glob key scanning
///
/// Implemented by [`MemoryCache`] and [`RedisCache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Delete keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Live keys matching a glob pattern where `*` matches any run of characters
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}

/// Match `text` against a glob where `*` matches any (possibly empty) run
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let mut segments: Vec<&str> = parts.collect();
    let Some(last) = segments.pop() else {
        // no `*` at all
        return rest.is_empty();
    };

    for segment in segments {
        match rest.find(segment) {
            Some(index) => rest = &rest[index + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

/// Typed, failure-tolerant wrapper around a [`CacheStore`]
pub struct BlogCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl BlogCache {
    const NAME: &'static str = "blogs";

    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Look up and decode a cached value
    ///
    /// Any failure is reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&["get"]).inc();
                tracing::warn!(%key, %error, "Cache read failed, falling back to database");
                None
            }
        };

        let decoded = raw.and_then(|raw| match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&["decode"]).inc();
                tracing::warn!(%key, %error, "Discarding undecodable cache entry");
                None
            }
        });

        if decoded.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&[Self::NAME]).inc();
            tracing::debug!(%key, "Cache hit");
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&[Self::NAME]).inc();
            tracing::debug!(%key, "Cache miss");
        }

        decoded
    }

    /// Store a value with the configured TTL
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&["encode"]).inc();
                tracing::warn!(%key, %error, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(error) = self.store.set(key, payload, self.ttl).await {
            CACHE_ERRORS_TOTAL.with_label_values(&["set"]).inc();
            tracing::warn!(%key, %error, "Error setting cache");
        }
    }

    /// Drop every cached read affected by a change to `user_id`'s blogs
    ///
    /// Deletes the unfiltered list, the detail key of `blog_id` (if given)
    /// and then every title-filtered list of the user.
    pub async fn invalidate_user_blogs(&self, user_id: i64, blog_id: Option<i64>) {
        let mut exact = vec![keys::user_blogs(user_id)];
        if let Some(blog_id) = blog_id {
            exact.push(keys::user_blog(user_id, blog_id));
        }
        self.delete(&exact, "exact").await;

        let pattern = keys::user_title_pattern(user_id);
        match self.store.keys_matching(&pattern).await {
            Ok(filtered) => self.delete(&filtered, "pattern").await,
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&["scan"]).inc();
                tracing::warn!(%pattern, %error, "Cache scan failed, filtered lists may be stale until TTL");
            }
        }

        tracing::debug!(user_id, ?blog_id, %pattern, "Invalidated blog cache");
    }

    async fn delete(&self, keys: &[String], kind: &str) {
        if keys.is_empty() {
            return;
        }
        match self.store.delete(keys).await {
            Ok(removed) => CACHE_INVALIDATIONS_TOTAL
                .with_label_values(&[kind])
                .inc_by(removed),
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&["delete"]).inc();
                tracing::warn!(?keys, %error, "Cache delete failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn glob_match_handles_prefix_suffix_and_infix() {
        assert!(glob_match("user:1:blogs:title:*", "user:1:blogs:title:Rust"));
        assert!(glob_match("user:1:blogs:title:*", "user:1:blogs:title:"));
        assert!(!glob_match("user:1:blogs:title:*", "user:12:blogs:title:Rust"));
        assert!(!glob_match("user:1:blogs:title:*", "user:1:blogs"));
        assert!(glob_match("user:*:blogs", "user:3:blogs"));
        assert!(glob_match("a*b*c", "a-x-b-y-c"));
        assert!(!glob_match("a*b*c", "a-x-c-y-b"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    fn unavailable() -> CacheError {
        ::redis::RedisError::from((::redis::ErrorKind::IoError, "connection refused")).into()
    }

    /// Store whose every operation fails
    struct BrokenStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        }

        async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        }

        async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn backend_failures_degrade_to_misses() {
        let store = Arc::new(BrokenStore {
            calls: AtomicUsize::new(0),
        });
        let cache = BlogCache::new(store.clone(), Duration::from_secs(60));

        assert!(cache.get::<Vec<i64>>("user:1:blogs").await.is_none());
        cache.put("user:1:blogs", &vec![1, 2, 3]).await;
        cache.invalidate_user_blogs(1, Some(2)).await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn undecodable_entries_are_misses() {
        let store = Arc::new(MemoryCache::new(10));
        store
            .set("user:1:blogs", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = BlogCache::new(store, Duration::from_secs(60));

        assert!(cache.get::<Vec<i64>>("user:1:blogs").await.is_none());
    }

    #[tokio::test]
    async fn invalidation_removes_list_detail_and_filtered_keys() {
        let store = Arc::new(MemoryCache::new(100));
        let cache = BlogCache::new(store.clone(), Duration::from_secs(60));

        cache.put(&keys::user_blogs(1), &vec![1]).await;
        cache.put(&keys::user_blog(1, 5), &5).await;
        cache.put(&keys::user_blogs_by_title(1, "Blog"), &vec![1]).await;
        cache.put(&keys::user_blogs_by_title(1, "Other"), &vec![1]).await;
        cache.put(&keys::user_blogs(2), &vec![9]).await;

        cache.invalidate_user_blogs(1, Some(5)).await;

        assert!(cache.get::<Vec<i64>>(&keys::user_blogs(1)).await.is_none());
        assert!(cache.get::<i64>(&keys::user_blog(1, 5)).await.is_none());
        assert!(store.keys_matching("user:1:*").await.unwrap().is_empty());
        assert_eq!(cache.get::<Vec<i64>>(&keys::user_blogs(2)).await, Some(vec![9]));
    }
}
