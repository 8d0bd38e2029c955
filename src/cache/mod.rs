//! Region-keyed query result cache
//!
//! Repositories store the results of hot read queries here, grouped into named
//! regions so that a write can drop every cached result it may have made stale.
//! Region names for per-forum results carry the forum id (`...#<id>`).

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{Group, Topic};

/// Region names used by the forum repository
pub struct CacheRegion;

impl CacheRegion {
    pub const MODERATORS: &'static str = "forum_repository.moderators";
    pub const TOTAL_MESSAGES: &'static str = "forum_repository.total_messages";

    pub fn total_posts(forum_id: i32) -> String {
        format!("forum_repository.total_posts#{forum_id}")
    }

    pub fn total_topics(forum_id: i32) -> String {
        format!("forum_repository.total_topics#{forum_id}")
    }

    pub fn topics(forum_id: i32) -> String {
        format!("forum_repository.topics#{forum_id}")
    }

    /// Every per-forum region holding results derived from the forum's rows
    pub fn forum_regions(forum_id: i32) -> [String; 3] {
        [
            Self::total_posts(forum_id),
            Self::total_topics(forum_id),
            Self::topics(forum_id),
        ]
    }
}

/// Cache key: the region plus the bound query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub region: String,
    pub params: String,
}

impl CacheKey {
    pub fn new(region: impl Into<String>, params: impl ToString) -> Self {
        Self {
            region: region.into(),
            params: params.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Count(u64),
    Groups(Vec<Group>),
    Topics(Vec<Topic>),
}

/// Shared LRU cache of query results; cloning shares the same storage
#[derive(Clone)]
pub struct QueryCache {
    /// `None` when caching is disabled
    entries: Option<Arc<RwLock<LruCache<CacheKey, CachedValue>>>>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity)
                .map(|capacity| Arc::new(RwLock::new(LruCache::new(capacity)))),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self { entries: None }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.capacity)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let entries = self.entries.as_ref()?;
        let hit = entries.write().await.get(key).cloned();
        if hit.is_some() {
            debug!("Query cache hit: {} [{}]", key.region, key.params);
        }
        hit
    }

    pub async fn put(&self, key: CacheKey, value: CachedValue) {
        if let Some(entries) = &self.entries {
            entries.write().await.put(key, value);
        }
    }

    /// Drop every entry of a region, returning how many were removed
    pub async fn evict_region(&self, region: &str) -> usize {
        let Some(entries) = &self.entries else {
            return 0;
        };

        let mut entries = entries.write().await;
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.region == region)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }

        if !stale.is_empty() {
            debug!("Evicted {} entries from cache region {}", stale.len(), region);
        }
        stale.len()
    }

    /// Drop the per-forum regions of each given forum
    pub async fn evict_forums(&self, forum_ids: &[i32]) {
        for forum_id in forum_ids {
            for region in CacheRegion::forum_regions(*forum_id) {
                self.evict_region(&region).await;
            }
        }
    }

    pub async fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.write().await.clear();
        }
    }

    pub async fn len(&self) -> usize {
        match &self.entries {
            Some(entries) => entries.read().await.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(crate::config::defaults::DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_region_names_carry_forum_id() {
        assert_eq!(CacheRegion::total_posts(7), "forum_repository.total_posts#7");
        assert_eq!(CacheRegion::total_topics(7), "forum_repository.total_topics#7");
        assert_eq!(CacheRegion::topics(12), "forum_repository.topics#12");
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let cache = QueryCache::new(8);
        let key = CacheKey::new(CacheRegion::TOTAL_MESSAGES, "");
        assert!(cache.get(&key).await.is_none());

        cache.put(key.clone(), CachedValue::Count(3)).await;
        assert_eq!(cache.get(&key).await, Some(CachedValue::Count(3)));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_evict_region_only_touches_that_region() {
        let cache = QueryCache::new(8);
        cache
            .put(CacheKey::new(CacheRegion::topics(1), "0:10"), CachedValue::Topics(Vec::new()))
            .await;
        cache
            .put(CacheKey::new(CacheRegion::topics(1), "0:20"), CachedValue::Topics(Vec::new()))
            .await;
        cache
            .put(CacheKey::new(CacheRegion::topics(2), "0:10"), CachedValue::Topics(Vec::new()))
            .await;

        let removed = cache.evict_region(&CacheRegion::topics(1)).await;
        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 1);
        assert!(logs_contain("Evicted 2 entries"));
    }

    #[tokio::test]
    async fn test_evict_forums_drops_all_forum_regions() {
        let cache = QueryCache::new(8);
        cache
            .put(CacheKey::new(CacheRegion::total_posts(3), 3), CachedValue::Count(1))
            .await;
        cache
            .put(CacheKey::new(CacheRegion::total_topics(3), 3), CachedValue::Count(1))
            .await;
        cache
            .put(CacheKey::new(CacheRegion::MODERATORS, 3), CachedValue::Groups(Vec::new()))
            .await;

        cache.evict_forums(&[3]).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_lru_capacity_is_respected() {
        let cache = QueryCache::new(2);
        for i in 0..3 {
            cache
                .put(CacheKey::new(CacheRegion::TOTAL_MESSAGES, i), CachedValue::Count(i))
                .await;
        }
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&CacheKey::new(CacheRegion::TOTAL_MESSAGES, 0)).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_stores() {
        let cache = QueryCache::from_config(&CacheConfig {
            enabled: false,
            capacity: 16,
        });
        let key = CacheKey::new(CacheRegion::TOTAL_MESSAGES, "");
        cache.put(key.clone(), CachedValue::Count(1)).await;
        assert!(!cache.is_enabled());
        assert!(cache.get(&key).await.is_none());
        assert!(cache.is_empty().await);
    }
}
