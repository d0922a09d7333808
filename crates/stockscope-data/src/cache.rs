//! TTL cache with an injected clock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use stockscope_core::traits::Clock;
use tracing::debug;

/// Cached value with the time it was stored.
struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// Concurrent key/value cache whose entries expire after a fixed TTL.
///
/// Expired entries are evicted lazily when read, or in bulk by
/// [`TtlCache::purge_expired`]. A zero TTL disables caching.
pub struct TtlCache<V> {
    name: String,
    entries: DashMap<String, CacheEntry<V>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(name: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or_default()
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.cached_at >= self.ttl
    }

    /// Fresh value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if !self.is_expired(&entry, now) => {
                debug!(cache = %self.name, key, "Cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => {
                debug!(cache = %self.name, key, "Cache miss");
                return None;
            }
        }

        // The read guard is dropped before removing
        self.entries.remove_if(key, |_, entry| self.is_expired(entry, now));
        debug!(cache = %self.name, key, "Cache entry expired");
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                cached_at: self.clock.now(),
            },
        );
    }

    /// Return the cached value or run `fetch` and cache its success.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_insert_with<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Remove `key`, returning its value even if expired.
    pub fn invalidate(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockscope_core::traits::ManualClock;

    fn create_cache(ttl_secs: u64) -> (TtlCache<String>, ManualClock) {
        let clock = ManualClock::default();
        let cache = TtlCache::new("test", Duration::from_secs(ttl_secs), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_get_within_ttl() {
        let (cache, clock) = create_cache(60);
        cache.insert("2330", "TSMC".to_string());

        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(cache.get("2330").as_deref(), Some("TSMC"));
        assert_eq!(cache.get("2317"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let (cache, clock) = create_cache(60);
        cache.insert("2330", "TSMC".to_string());

        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("2330"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let (cache, _clock) = create_cache(0);
        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_purge_and_invalidate() {
        let (cache, clock) = create_cache(10);
        cache.insert("a", "1".to_string());
        clock.advance(chrono::Duration::seconds(5));
        cache.insert("b", "2".to_string());
        clock.advance(chrono::Duration::seconds(6));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate("b").as_deref(), Some("2"));
        assert!(cache.is_empty());

        cache.insert("c", "3".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_insert_with() {
        let (cache, clock) = create_cache(30);
        let mut calls = 0;

        let first: Result<String, String> = cache
            .get_or_insert_with("q", || {
                calls += 1;
                async { Ok("fetched".to_string()) }
            })
            .await;
        assert_eq!(first.unwrap(), "fetched");

        let second: Result<String, String> = cache
            .get_or_insert_with("q", || {
                calls += 1;
                async { Ok("refetched".to_string()) }
            })
            .await;
        assert_eq!(second.unwrap(), "fetched");
        assert_eq!(calls, 1);

        clock.advance(chrono::Duration::seconds(31));
        let third: Result<String, String> = cache
            .get_or_insert_with("q", || async { Ok("refetched".to_string()) })
            .await;
        assert_eq!(third.unwrap(), "refetched");
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (cache, _clock) = create_cache(30);
        let result: Result<String, &str> = cache
            .get_or_insert_with("q", || async { Err("upstream down") })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
