//! Caching layer for fundamental data to reduce API calls
//!
//! Financial statements change on a reporting cadence, so the pipeline
//! keeps them in a timed in-process cache; the caller decides staleness
//! on top of the TTL (balance-sheet date check).

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for provider data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Stock symbol
    pub symbol: String,
    /// Endpoint or operation type
    pub endpoint: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Thread-safe timed cache for provider data
pub struct DataCache {
    cache: Arc<RwLock<TimedCache<CacheKey, serde_json::Value>>>,
}

impl DataCache {
    /// Create a new cache with the specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// If the value exists in cache, it's returned immediately.
    /// Otherwise, the fetcher function is called and the result is cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: CacheKey,
        fetcher: F,
    ) -> Result<serde_json::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<serde_json::Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for DataCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = DataCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "statements");
        let value = json!({"balance_sheet": {"date": "2026-01-31"}});

        cache.insert(key.clone(), value.clone()).await;

        let retrieved = cache.get(&key).await;
        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = DataCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "statements");
        let value = json!({"revenue": 1});

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(value.clone()) }
            })
            .await
            .expect("fetch");
        assert_eq!(result, value);
        assert_eq!(call_count, 1);

        // second call served from cache
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(json!({"revenue": 2})) }
            })
            .await
            .expect("fetch");
        assert_eq!(result, value);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_cache_invalidation() {
        let cache = DataCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "statements");

        cache.insert(key.clone(), json!(1)).await;
        assert!(cache.get(&key).await.is_some());

        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());
        assert!(cache.is_empty().await);
    }
}
