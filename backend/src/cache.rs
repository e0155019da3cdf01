//! Per-run read cache
//!
//! A job run reads the same documents from several places (the user list,
//! water and supplement documents, calendar events). [`RunCache`] keeps them
//! for a configurable time. It is created for each run and passed down
//! explicitly, and expiry is measured against the injected [`Clock`].

use crate::config::CacheConfig;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;
use wellness_tracker_shared::{CalendarEvent, Clock, SupplementItem, User, WaterState};

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Map whose entries expire `ttl` after insertion
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        self.entries
            .write()
            .await
            .insert(key, Entry { value, stored_at });
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    /// Cached value, or the result of `load` which is then cached
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }
        let value = load().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}

/// Caches shared by every user pipeline in one run
pub struct RunCache {
    pub users: TtlCache<(), Vec<User>>,
    pub calendar: TtlCache<String, Vec<CalendarEvent>>,
    pub water: TtlCache<String, Option<WaterState>>,
    pub supplements: TtlCache<String, Vec<SupplementItem>>,
}

impl RunCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: TtlCache::new(Duration::seconds(config.users_ttl_secs), clock.clone()),
            calendar: TtlCache::new(Duration::seconds(config.calendar_ttl_secs), clock.clone()),
            water: TtlCache::new(Duration::seconds(config.water_ttl_secs), clock.clone()),
            supplements: TtlCache::new(Duration::seconds(config.supplements_ttl_secs), clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wellness_tracker_shared::ManualClock;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let clock = clock();
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::seconds(60), clock.clone());
        cache.insert("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        clock.advance(Duration::seconds(59));
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_get_or_load_loads_once() {
        let cache: TtlCache<(), i32> = TtlCache::new(Duration::seconds(60), clock());
        let first = cache.get_or_load((), || async { Ok(7) }).await.unwrap();
        let second = cache
            .get_or_load((), || async { Err(anyhow::anyhow!("should not load again")) })
            .await
            .unwrap();
        assert_eq!((first, second), (7, 7));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache: TtlCache<(), i32> = TtlCache::new(Duration::seconds(60), clock());
        tokio_test::block_on(async {
            assert!(cache
                .get_or_load((), || async { Err(anyhow::anyhow!("store down")) })
                .await
                .is_err());
            assert_eq!(cache.get(&()).await, None);
        });
    }

    #[tokio::test]
    async fn test_invalidate_drops_one_key() {
        let cache = RunCache::new(&CacheConfig::default(), clock());
        cache.water.insert("u1".to_string(), Some(WaterState::default())).await;
        cache.water.insert("u2".to_string(), None).await;
        cache.water.invalidate(&"u1".to_string()).await;
        assert!(cache.water.get(&"u1".to_string()).await.is_none());
        assert!(cache.water.get(&"u2".to_string()).await.is_some());
    }
}
