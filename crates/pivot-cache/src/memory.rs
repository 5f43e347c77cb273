//! In-memory LRU backend
//!
//! A map plus a recency queue under one mutex, so check-then-insert is
//! atomic per key. `set` evicts least-recently-used entries until the
//! configured bound holds before it returns; callers never observe the map
//! over capacity. TTL is enforced on read: an expired entry reports absent
//! and is dropped, but unread stale entries may stay resident until
//! capacity pressure or an explicit invalidate reclaims them.

use crate::{Cache, CacheBackendError, CacheKey};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Slot {
    payload: Arc<Value>,
    expires_at: Instant,
}

struct Inner {
    map: HashMap<CacheKey, Slot>,
    /// Recency order, least recently used at the front
    order: VecDeque<CacheKey>,
}

/// Bounded in-memory cache with LRU eviction and per-entry TTL
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Create a cache bounded to `max_entries` live entries
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        MemoryCache {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    /// Number of resident entries, stale included
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// True when no entries are resident
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn touch(order: &mut VecDeque<CacheKey>, key: &CacheKey) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
    }
    order.push_back(*key);
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Arc<Value>>, CacheBackendError> {
        let mut inner = self.inner.lock();
        let live = match inner.map.get(key) {
            None => return Ok(None),
            Some(slot) if slot.expires_at <= Instant::now() => None,
            Some(slot) => Some(slot.payload.clone()),
        };
        match live {
            Some(payload) => {
                touch(&mut inner.order, key);
                Ok(Some(payload))
            }
            None => {
                debug!(%key, "cache entry expired on read");
                inner.map.remove(key);
                if let Some(pos) = inner.order.iter().position(|k| k == key) {
                    inner.order.remove(pos);
                }
                Ok(None)
            }
        }
    }

    async fn set(
        &self,
        key: CacheKey,
        payload: Arc<Value>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheBackendError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut inner = self.inner.lock();
        inner.map.insert(
            key,
            Slot {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        touch(&mut inner.order, &key);
        while inner.map.len() > self.max_entries {
            let Some(victim) = inner.order.pop_front() else {
                break;
            };
            debug!(key = %victim, "evicting least-recently-used entry");
            inner.map.remove(&victim);
        }
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheBackendError> {
        let mut inner = self.inner.lock();
        inner.map.remove(key);
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            inner.order.remove(pos);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_core::{Indicator, IndicatorType};
    use serde_json::json;

    fn key(value: &str) -> CacheKey {
        let ind = Indicator::new(IndicatorType::Text, value).unwrap();
        CacheKey::new("test", &ind, &[])
    }

    fn payload(n: u64) -> Arc<Value> {
        Arc::new(json!({ "n": n }))
    }

    #[tokio::test]
    async fn get_returns_what_set_stored() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache.set(key("a"), payload(1), None).await.unwrap();
        let hit = cache.get(&key("a")).await.unwrap().unwrap();
        assert_eq!(*hit, json!({ "n": 1 }));
        assert!(cache.get(&key("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_report_absent() {
        let cache = MemoryCache::new(10, Duration::from_millis(10));
        cache.set(key("a"), payload(1), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(&key("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn per_entry_ttl_overrides_default() {
        let cache = MemoryCache::new(10, Duration::from_secs(60));
        cache
            .set(key("a"), payload(1), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get(&key("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insertion_never_exceeds_bound() {
        let cache = MemoryCache::new(3, Duration::from_secs(60));
        for i in 0..10u64 {
            cache.set(key(&format!("k{i}")), payload(i), None).await.unwrap();
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn eviction_victims_are_least_recently_used() {
        let cache = MemoryCache::new(3, Duration::from_secs(60));
        cache.set(key("a"), payload(1), None).await.unwrap();
        cache.set(key("b"), payload(2), None).await.unwrap();
        cache.set(key("c"), payload(3), None).await.unwrap();

        // Refresh "a" so "b" is now the coldest
        cache.get(&key("a")).await.unwrap();
        cache.set(key("d"), payload(4), None).await.unwrap();

        assert!(cache.get(&key("b")).await.unwrap().is_none());
        assert!(cache.get(&key("a")).await.unwrap().is_some());
        assert!(cache.get(&key("c")).await.unwrap().is_some());
        assert!(cache.get(&key("d")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrite_same_key_keeps_one_entry() {
        let cache = MemoryCache::new(3, Duration::from_secs(60));
        cache.set(key("a"), payload(1), None).await.unwrap();
        cache.set(key("a"), payload(2), None).await.unwrap();
        assert_eq!(cache.len(), 1);
        let hit = cache.get(&key("a")).await.unwrap().unwrap();
        assert_eq!(*hit, json!({ "n": 2 }));
    }

    #[tokio::test]
    async fn invalidate_drops_the_entry() {
        let cache = MemoryCache::new(3, Duration::from_secs(60));
        cache.set(key("a"), payload(1), None).await.unwrap();
        cache.invalidate(&key("a")).await.unwrap();
        assert!(cache.get(&key("a")).await.unwrap().is_none());
        assert!(cache.is_empty());
    }
}
