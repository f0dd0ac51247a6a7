//! Bounded result store with pluggable eviction and TTL expiry.

use super::eviction::{EvictionCandidate, EvictionStrategy};
use super::key::CacheKey;
use crate::config::CacheConfig;
use crate::orchestration::types::ComputationResult;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Running hit/miss accounting since the cache was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    /// Fraction of `get` calls that hit; 0.0 before any lookup
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub size: usize,
    pub evictions: u64,
    pub expirations: u64,
}

/// Point-in-time view of the stored entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub total_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    pub most_accessed: Option<String>,
    pub eviction_strategy: EvictionStrategy,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ComputationResult,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    access_count: u64,
    approximate_size: usize,
    inserted_at: Instant,
    inserted_seq: u64,
    accessed_seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.inserted_at.elapsed() >= ttl)
    }

    fn candidate(&self) -> EvictionCandidate {
        EvictionCandidate {
            inserted_seq: self.inserted_seq,
            accessed_seq: self.accessed_seq,
            access_count: self.access_count,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Thread-safe result cache
#[derive(Debug)]
pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    /// Create a cache; a `max_entries` of 0 is raised to 1
    pub fn new(mut config: CacheConfig) -> Self {
        config.max_entries = config.max_entries.max(1);
        debug!(
            max_entries = config.max_entries,
            ttl_ms = config.ttl_ms,
            eviction_strategy = %config.eviction_strategy,
            "Result cache created"
        );
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up `key`, returning an owned copy of the stored result
    pub fn get(&self, key: &CacheKey) -> Option<ComputationResult> {
        let ttl = self.config.ttl();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                debug!(key = %key, "Cache MISS");
                return None;
            }
            Some(entry) => entry.is_expired(ttl),
        };

        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            state.misses += 1;
            debug!(key = %key, "Cache MISS (expired)");
            return None;
        }

        let seq = state.next_seq();
        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.access_count += 1;
        entry.accessed_seq = seq;
        entry.last_accessed_at = Utc::now();
        debug!(key = %key, access_count = entry.access_count, "Cache HIT");
        Some(entry.value.clone())
    }

    /// Store `value` under `key`, evicting one entry first if the cache is full
    pub fn set(&self, key: CacheKey, value: ComputationResult) {
        let approximate_size = serde_json::to_vec(&value)
            .map(|bytes| bytes.len())
            .unwrap_or_default();
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.max_entries {
            self.evict_one(&mut state);
        }

        let seq = state.next_seq();
        let now = Utc::now();
        debug!(key = %key, approximate_size, "Cache SET");
        state.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                last_accessed_at: now,
                access_count: 0,
                approximate_size,
                inserted_at: Instant::now(),
                inserted_seq: seq,
                accessed_seq: seq,
            },
        );
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Drop every entry; hit/miss accounting is preserved
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        debug!(dropped, "Cache cleared");
    }

    /// Whether a live entry exists, without touching hit/miss accounting
    pub fn contains(&self, key: &CacheKey) -> bool {
        let ttl = self.config.ttl();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(ttl))
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.config.ttl() else {
            return 0;
        };
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(Some(ttl)));
        let purged = before - state.entries.len();
        state.expirations += purged as u64;
        purged
    }

    /// Remove every entry produced by `type_tag`
    pub fn invalidate_tag(&self, type_tag: &str) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| key.type_tag != type_tag);
        let removed = before - state.entries.len();
        debug!(type_tag, removed, "Cache entries invalidated");
        removed
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        let state = self.state.lock();
        let lookups = state.hits + state.misses;
        let (hit_rate, miss_rate) = if lookups == 0 {
            (0.0, 0.0)
        } else {
            (
                state.hits as f64 / lookups as f64,
                state.misses as f64 / lookups as f64,
            )
        };

        CacheMetrics {
            hits: state.hits,
            misses: state.misses,
            hit_rate,
            miss_rate,
            size: state.entries.len(),
            evictions: state.evictions,
            expirations: state.expirations,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let entries = state.entries.iter();

        CacheStats {
            size: state.entries.len(),
            max_entries: self.config.max_entries,
            total_bytes: state.entries.values().map(|e| e.approximate_size).sum(),
            oldest_entry: state.entries.values().map(|e| e.created_at).min(),
            newest_entry: state.entries.values().map(|e| e.created_at).max(),
            most_accessed: entries
                .max_by_key(|(_, e)| (e.access_count, std::cmp::Reverse(e.inserted_seq)))
                .map(|(key, _)| key.to_string()),
            eviction_strategy: self.config.eviction_strategy,
        }
    }

    fn evict_one(&self, state: &mut CacheState) {
        let victim = self
            .config
            .eviction_strategy
            .select_victim(state.entries.iter().map(|(key, entry)| (key, entry.candidate())))
            .cloned();

        if let Some(victim) = victim {
            state.entries.remove(&victim);
            state.evictions += 1;
            debug!(
                key = %victim,
                strategy = %self.config.eviction_strategy,
                "Cache entry evicted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn key(tag: &str, fingerprint: &str) -> CacheKey {
        CacheKey::new(tag, fingerprint)
    }

    fn result(tag: &str, n: i64) -> ComputationResult {
        ComputationResult::success(tag, json!({ "n": n }))
    }

    fn cache(max_entries: usize, strategy: EvictionStrategy) -> ResultCache {
        ResultCache::new(CacheConfig::new(
            max_entries,
            Duration::from_secs(3600),
            strategy,
        ))
    }

    #[test]
    fn test_get_miss_then_hit() {
        let cache = cache(10, EvictionStrategy::Lru);
        let k = key("tarot", "f1");

        assert!(cache.get(&k).is_none());
        cache.set(k.clone(), result("tarot", 1));
        let hit = cache.get(&k).unwrap();
        assert_eq!(hit.payload, json!({ "n": 1 }));

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate, 0.5);
        assert_eq!(metrics.miss_rate, 0.5);
        assert_eq!(metrics.size, 1);
    }

    #[test]
    fn test_metrics_before_any_lookup() {
        let metrics = cache(1, EvictionStrategy::Lru).metrics();
        assert_eq!(metrics.hit_rate, 0.0);
        assert_eq!(metrics.miss_rate, 0.0);
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let cache = cache(2, EvictionStrategy::Lru);
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        assert!(cache.get(&key("a", "1")).is_some());

        cache.set(key("c", "1"), result("c", 1));

        assert!(cache.contains(&key("a", "1")));
        assert!(!cache.contains(&key("b", "1")));
        assert!(cache.contains(&key("c", "1")));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_fifo_evicts_first_inserted_regardless_of_access() {
        let cache = cache(2, EvictionStrategy::Fifo);
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        assert!(cache.get(&key("a", "1")).is_some());

        cache.set(key("c", "1"), result("c", 1));

        assert!(!cache.contains(&key("a", "1")));
        assert!(cache.contains(&key("b", "1")));
        assert!(cache.contains(&key("c", "1")));
    }

    #[test]
    fn test_lfu_evicts_lowest_access_count() {
        let cache = cache(2, EvictionStrategy::Lfu);
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        cache.get(&key("a", "1"));
        cache.get(&key("a", "1"));
        cache.get(&key("b", "1"));

        cache.set(key("c", "1"), result("c", 1));

        assert!(cache.contains(&key("a", "1")));
        assert!(!cache.contains(&key("b", "1")));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = cache(2, EvictionStrategy::Fifo);
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        cache.set(key("a", "1"), result("a", 2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.metrics().evictions, 0);
        assert_eq!(cache.get(&key("a", "1")).unwrap().payload, json!({ "n": 2 }));
    }

    #[test]
    fn test_ttl_expiry_is_a_miss() {
        let cache = ResultCache::new(CacheConfig::new(
            10,
            Duration::from_millis(20),
            EvictionStrategy::Lru,
        ));
        let k = key("tarot", "f1");
        cache.set(k.clone(), result("tarot", 1));
        std::thread::sleep(Duration::from_millis(40));

        assert!(!cache.contains(&k));
        assert!(cache.get(&k).is_none());
        let metrics = cache.metrics();
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let cache = ResultCache::new(CacheConfig::new(10, Duration::ZERO, EvictionStrategy::Lru));
        cache.set(key("a", "1"), result("a", 1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key("a", "1")).is_some());
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResultCache::new(CacheConfig::new(
            10,
            Duration::from_millis(20),
            EvictionStrategy::Lru,
        ));
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        std::thread::sleep(Duration::from_millis(40));
        cache.set(key("c", "1"), result("c", 1));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.metrics().expirations, 2);
    }

    #[test]
    fn test_remove_clear_and_invalidate_tag() {
        let cache = cache(10, EvictionStrategy::Lru);
        cache.set(key("tarot", "1"), result("tarot", 1));
        cache.set(key("tarot", "2"), result("tarot", 2));
        cache.set(key("runes", "1"), result("runes", 1));

        assert!(cache.remove(&key("runes", "1")));
        assert!(!cache.remove(&key("runes", "1")));
        assert_eq!(cache.invalidate_tag("tarot"), 2);
        assert!(cache.is_empty());

        cache.set(key("runes", "1"), result("runes", 1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_contains_does_not_affect_metrics() {
        let cache = cache(10, EvictionStrategy::Lru);
        cache.set(key("a", "1"), result("a", 1));
        assert!(cache.contains(&key("a", "1")));
        assert!(!cache.contains(&key("b", "1")));

        let metrics = cache.metrics();
        assert_eq!(metrics.hits + metrics.misses, 0);
    }

    #[test]
    fn test_stats_reports_most_accessed() {
        let cache = cache(10, EvictionStrategy::Lru);
        cache.set(key("a", "1"), result("a", 1));
        cache.set(key("b", "1"), result("b", 1));
        cache.get(&key("b", "1"));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_entries, 10);
        assert!(stats.total_bytes > 0);
        assert!(stats.oldest_entry <= stats.newest_entry);
        assert_eq!(stats.most_accessed.as_deref(), Some("b:1"));
        assert_eq!(stats.eviction_strategy, EvictionStrategy::Lru);
    }

    #[test]
    fn test_returned_value_is_a_copy() {
        let cache = cache(10, EvictionStrategy::Lru);
        cache.set(key("a", "1"), result("a", 1));

        let mut copy = cache.get(&key("a", "1")).unwrap();
        copy.payload = json!({ "n": 99 });

        assert_eq!(cache.get(&key("a", "1")).unwrap().payload, json!({ "n": 1 }));
    }

    #[tokio::test]
    async fn test_concurrent_get_and_set() {
        let cache = Arc::new(cache(50, EvictionStrategy::Lru));
        let mut handles = Vec::new();

        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for n in 0..25 {
                    let k = key("tag", &format!("{worker}-{n}"));
                    cache.set(k.clone(), result("tag", n));
                    cache.get(&k);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(cache.len() <= 50);
        let metrics = cache.metrics();
        assert_eq!(metrics.hits + metrics.misses, 200);
    }
}
