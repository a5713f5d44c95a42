//! In-Memory Search Result Cache
//!
//! Thread-safe cache for scraped post lists, keyed by the normalized search
//! query. DashMap gives concurrent access without a global lock.
//!
//! Features:
//! - TTL-based expiration (5 minutes default)
//! - Key normalization (lowercase)
//! - Cache HIT/MISS logging and counters

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::types::{Post, PostSource};
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;

/// Cache entry with its creation time
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub posts: Vec<Post>,
    /// Where the posts originally came from (live or demo)
    pub origin: PostSource,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > Duration::from_secs(self.ttl_secs)
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        let elapsed = self.created_at.elapsed().as_secs();
        self.ttl_secs.saturating_sub(elapsed)
    }
}

/// Search result cache
#[derive(Clone)]
pub struct PostCache {
    /// lowercase query key -> CacheEntry
    store: Arc<DashMap<String, CacheEntry>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for PostCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PostCache {
    /// Cache with the default TTL (5 minutes)
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn normalize_key(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Cached entry if present and not expired; expired entries are dropped
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let key = Self::normalize_key(key);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // release the shard read lock before removing
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!(
                    "✅ CACHE HIT: {} ({} posts, TTL: {}s remaining)",
                    key,
                    entry.posts.len(),
                    entry.remaining_ttl()
                );
                Some(entry.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            None
        }
    }

    pub fn set(&self, key: &str, posts: Vec<Post>, origin: PostSource) {
        let key = Self::normalize_key(key);
        let entry = CacheEntry {
            posts,
            origin,
            created_at: Instant::now(),
            ttl_secs: self.ttl_secs,
        };
        self.store.insert(key.clone(), entry);
        info!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl_secs);
    }

    pub fn invalidate(&self, key: &str) {
        let key = Self::normalize_key(key);
        self.store.remove(&key);
        debug!("🗑️ CACHE INVALIDATE: {}", key);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before - self.store.len();
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl_secs,
        }
    }

    pub fn clear(&self) {
        self.store.clear();
        info!("🗑️ CACHE CLEARED");
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{PostTypeFilter, TimeFilter};
    use crate::providers::demo::demo_posts;
    use chrono::Utc;

    fn sample_posts() -> Vec<Post> {
        demo_posts(&[], TimeFilter::Month, PostTypeFilter::All, 3, Utc::now())
    }

    #[test]
    fn test_cache_set_get() {
        let cache = PostCache::new();
        cache.set("#ui|month|all|50", sample_posts(), PostSource::Live);

        let entry = cache.get("#ui|month|all|50").unwrap();
        assert_eq!(entry.posts.len(), 3);
        assert_eq!(entry.origin, PostSource::Live);
    }

    #[test]
    fn test_key_normalization() {
        let cache = PostCache::new();
        cache.set("#UI|Month|All|50", sample_posts(), PostSource::Demo);
        assert!(cache.get("#ui|month|all|50").is_some());
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = PostCache::with_ttl(0);
        cache.set("k", sample_posts(), PostSource::Live);
        std::thread::sleep(Duration::from_millis(1100));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_cleanup_and_invalidate() {
        let cache = PostCache::with_ttl(0);
        cache.set("a", sample_posts(), PostSource::Live);
        cache.set("b", sample_posts(), PostSource::Live);
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(cache.cleanup_expired(), 2);

        let cache = PostCache::new();
        cache.set("a", sample_posts(), PostSource::Live);
        cache.invalidate("A");
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_cache_stats() {
        let cache = PostCache::new();
        cache.set("key", sample_posts(), PostSource::Live);
        cache.get("key");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }
}
