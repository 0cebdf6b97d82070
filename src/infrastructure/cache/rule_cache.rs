//! Bounded in-process cache for per-domain extraction rules.
//!
//! An explicit cache object owned by the rule service instance, never a
//! process-wide singleton. Entries are invalidated only by
//! [`RuleCache::clear`]; there is no TTL. Rule changes are rare and
//! operator-driven.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::domain::entities::DomainRule;

const SHARD_COUNT: usize = 8;

/// Sharded LRU cache mapping a domain to its active rules.
///
/// Sharding by domain hash gives fine-grained locking: a cache population
/// on one shard never blocks lookups for domains hashing elsewhere, and the
/// per-shard critical section is a handful of pointer moves.
pub struct RuleCache {
    shards: Vec<Mutex<LruCache<String, Arc<Vec<DomainRule>>>>>,
}

impl RuleCache {
    /// Creates a cache holding at most `capacity` domains overall.
    ///
    /// Capacities below the shard count are rounded up so every shard holds
    /// at least one entry.
    pub fn new(capacity: usize) -> Self {
        let per_shard = NonZeroUsize::new(capacity.div_ceil(SHARD_COUNT).max(1))
            .expect("per-shard capacity is at least 1");
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(LruCache::new(per_shard)))
            .collect();
        Self { shards }
    }

    fn shard(&self, domain: &str) -> &Mutex<LruCache<String, Arc<Vec<DomainRule>>>> {
        let mut hasher = DefaultHasher::new();
        domain.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Returns the cached rules for a domain, refreshing its recency.
    pub fn get(&self, domain: &str) -> Option<Arc<Vec<DomainRule>>> {
        self.shard(domain).lock().get(domain).cloned()
    }

    /// Caches the rules for a domain, evicting the least recently used
    /// domain in the shard if full.
    pub fn insert(&self, domain: &str, rules: Arc<Vec<DomainRule>>) {
        self.shard(domain).lock().put(domain.to_string(), rules);
    }

    /// Drops every cached entry. The only invalidation path.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    /// Number of cached domains across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Arc<Vec<DomainRule>> {
        Arc::new(Vec::new())
    }

    #[test]
    fn test_get_returns_inserted_entry() {
        let cache = RuleCache::new(16);
        cache.insert("example.com", rules());
        assert!(cache.get("example.com").is_some());
        assert!(cache.get("other.com").is_none());
    }

    #[test]
    fn test_clear_empties_all_shards() {
        let cache = RuleCache::new(64);
        for i in 0..20 {
            cache.insert(&format!("site{i}.example.com"), rules());
        }
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_eviction() {
        // Capacity 8 → one slot per shard; hammering one shard must evict.
        let cache = RuleCache::new(8);
        for i in 0..100 {
            cache.insert(&format!("site{i}.example.com"), rules());
        }
        assert!(cache.len() <= SHARD_COUNT);
    }

    #[test]
    fn test_tiny_capacity_still_caches() {
        let cache = RuleCache::new(1);
        cache.insert("example.com", rules());
        assert!(cache.get("example.com").is_some());
    }
}
