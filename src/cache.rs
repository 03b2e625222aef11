use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

/// Cache statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Default)]
struct CacheInner {
    map: HashMap<String, String>,
    /// Keys in insertion order; the front is the eviction candidate.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Bounded correction cache with FIFO eviction.
///
/// Staleness is controlled entirely by the pipeline-version component of the
/// keys and the capacity bound; there is no TTL. The mutex is only held for
/// map operations, never across an await point.
pub struct CorrectionCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl CorrectionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        match inner.map.get(key).cloned() {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a correction. At capacity the oldest-inserted entry is evicted
    /// first (FIFO, not LRU). Re-inserting an existing key replaces the value
    /// without touching its position; the last write wins.
    pub fn put(&self, key: &str, value: &str) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.map.contains_key(key) {
            inner.map.insert(key.to_string(), value.to_string());
            return;
        }
        if inner.map.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
        inner.map.insert(key.to_string(), value.to_string());
        inner.order.push_back(key.to_string());
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.clear();
        inner.order.clear();
        inner.hits = 0;
        inner.misses = 0;
        info!("Correction cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            size: inner.map.len(),
            max_size: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_put() {
        let cache = CorrectionCache::new(10);
        assert_eq!(cache.get("k1"), None);
        cache.put("k1", "Hello.");
        assert_eq!(cache.get("k1"), Some("Hello.".to_string()));
    }

    #[test]
    fn test_fifo_eviction_removes_earliest_inserted() {
        let cache = CorrectionCache::new(3);
        cache.put("k1", "a");
        cache.put("k2", "b");
        cache.put("k3", "c");
        // Access order must not matter: touch k1, then overflow.
        assert!(cache.get("k1").is_some());
        cache.put("k4", "d");

        let stats = cache.stats();
        assert_eq!(stats.size, 3);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k4"), Some("d".to_string()));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = CorrectionCache::new(5);
        for i in 0..50 {
            cache.put(&format!("k{i}"), "v");
        }
        assert_eq!(cache.stats().size, 5);
        // The five newest keys survive.
        for i in 45..50 {
            assert!(cache.get(&format!("k{i}")).is_some());
        }
    }

    #[test]
    fn test_reinsert_existing_key_replaces_value_without_growth() {
        let cache = CorrectionCache::new(2);
        cache.put("k1", "old");
        cache.put("k1", "new");
        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get("k1"), Some("new".to_string()));
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = CorrectionCache::new(10);
        cache.get("absent");
        cache.put("k1", "v");
        cache.get("k1");
        cache.get("k1");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_resets_entries_and_counters() {
        let cache = CorrectionCache::new(10);
        cache.put("k1", "v");
        cache.get("k1");
        cache.get("absent");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_zero_capacity_cache_stores_nothing() {
        let cache = CorrectionCache::new(0);
        cache.put("k1", "v");
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.stats().size, 0);
    }
}
