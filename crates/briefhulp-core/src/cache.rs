//! Small thread-safe LRU cache with a time-to-live.
//!
//! Used for query embeddings and rendered speech, both of which are
//! expensive to recompute and keyed by the exact input text.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe LRU cache keyed by string.
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Least recently used key at the front.
    order: VecDeque<String>,
    max_size: usize,
    ttl: Duration,
}

impl<V> CacheInner<V> {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: VecDeque::with_capacity(max_size),
                max_size: max_size.max(1),
                ttl,
            }),
        }
    }

    /// Get a cached value. Returns None on miss or expired entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        let (value, expired) = match inner.entries.get(key) {
            Some(entry) => (entry.value.clone(), entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };

        if expired {
            inner.remove(key);
            return None;
        }
        inner.touch(key);
        Some(value)
    }

    /// Insert a value, evicting the least recently used entry when full.
    pub fn put(&self, key: String, value: V) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.touch(&key);
        } else {
            while inner.entries.len() >= inner.max_size {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
            inner.order.push_back(key.clone());
        }

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache: TtlCache<Vec<u8>> = TtlCache::new(10, Duration::from_secs(3600));
        assert!(cache.get("brief").is_none());

        cache.put("brief".into(), vec![1, 2, 3]);
        assert_eq!(cache.get("brief"), Some(vec![1, 2, 3]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = TtlCache::new(2, Duration::from_secs(3600));
        cache.put("a".into(), 1);
        cache.put("b".into(), 2);

        // Reading "a" makes "b" the eviction candidate
        assert_eq!(cache.get("a"), Some(1));
        cache.put("c".into(), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let cache = TtlCache::new(2, Duration::from_secs(3600));
        cache.put("a".into(), 1);
        cache.put("a".into(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = TtlCache::new(10, Duration::from_millis(1));
        cache.put("kort".into(), 1);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("kort").is_none());
        assert!(cache.is_empty());
    }
}
