//! Short-lived cache of merged search results

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::entity::{SearchQuery, SearchResult};

/// Default number of cached queries
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default lifetime of a cached entry
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedResults {
    stored_at: Instant,
    results: Arc<Vec<SearchResult>>,
}

/// LRU of result lists keyed by the normalized query, with TTL expiry
pub struct ResultCache {
    entries: Mutex<LruCache<String, CachedResults>>,
    ttl: Duration,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

impl ResultCache {
    /// A capacity of 0 is treated as 1
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cache key: the query with its term trimmed and lowercased
    pub fn key(query: &SearchQuery) -> String {
        let mut normalized = query.clone();
        normalized.search_term = query.search_term.trim().to_lowercase();
        normalized.page_size = query.effective_page_size();
        serde_json::to_string(&normalized).unwrap_or(normalized.search_term)
    }

    /// Fresh results for `query`, if cached
    pub async fn get(&self, query: &SearchQuery) -> Option<Arc<Vec<SearchResult>>> {
        let key = Self::key(query);
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(key = %key, "Result cache hit");
                return Some(entry.results.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&key);
        }
        None
    }

    pub async fn insert(&self, query: &SearchQuery, results: Arc<Vec<SearchResult>>) {
        let entry = CachedResults {
            stored_at: Instant::now(),
            results,
        };
        self.entries.lock().await.put(Self::key(query), entry);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::entity::{EntityType, SortBy};

    fn results(id: &str) -> Arc<Vec<SearchResult>> {
        Arc::new(vec![SearchResult::new(id, EntityType::Content, id, "")])
    }

    #[tokio::test]
    async fn test_key_normalizes_term() {
        assert_eq!(
            ResultCache::key(&SearchQuery::new("  Rust ")),
            ResultCache::key(&SearchQuery::new("rust"))
        );
        assert_ne!(
            ResultCache::key(&SearchQuery::new("rust")),
            ResultCache::key(&SearchQuery::new("rust").with_sort(SortBy::Newest))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = ResultCache::new(4, Duration::from_secs(10));
        let query = SearchQuery::new("rust");
        cache.insert(&query, results("p1")).await;

        assert_eq!(cache.get(&query).await.unwrap()[0].id, "p1");

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get(&query).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_least_recently_used_evicted() {
        let cache = ResultCache::new(2, Duration::from_secs(60));
        let a = SearchQuery::new("a");
        let b = SearchQuery::new("b");
        let c = SearchQuery::new("c");

        cache.insert(&a, results("a")).await;
        cache.insert(&b, results("b")).await;
        cache.get(&a).await;
        cache.insert(&c, results("c")).await;

        assert!(cache.get(&a).await.is_some());
        assert!(cache.get(&b).await.is_none());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_caches() {
        let cache = ResultCache::new(0, Duration::from_secs(60));
        let query = SearchQuery::new("rust");
        cache.insert(&query, results("p1")).await;
        assert!(cache.get(&query).await.is_some());
    }
}
