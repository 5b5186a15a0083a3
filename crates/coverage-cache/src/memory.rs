//! In-memory cache implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use coverage_core::{DayKey, PerDaySnapshot, Result, SnapshotCache};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamps for TTL invalidation and LRU eviction.
#[derive(Debug)]
struct CacheEntry {
    data: Arc<PerDaySnapshot>,
    cached_at: chrono::DateTime<Utc>,
    last_access: AtomicU64,
}

impl CacheEntry {
    fn new(data: Arc<PerDaySnapshot>, tick: u64) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            last_access: AtomicU64::new(tick),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Process-lifetime cache of validated day snapshots.
///
/// Unbounded by default: day snapshots are immutable, so an entry never
/// needs refreshing. [`with_capacity`](Self::with_capacity) caps the number of
/// days held, evicting the least recently used, and [`with_ttl`](Self::with_ttl)
/// treats entries older than the TTL as misses.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<DayKey, CacheEntry>>,
    capacity: Option<usize>,
    ttl: Option<Duration>,
    clock: AtomicU64,
}

impl InMemoryCache {
    /// Create a new empty, unbounded in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the cache at `capacity` days (at least one).
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity.max(1));
        self
    }

    /// Treat entries older than `ttl` as misses.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the configured capacity, if bounded.
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Removes the least recently used entry other than `keep`.
fn evict_lru(entries: &mut HashMap<DayKey, CacheEntry>, keep: &DayKey) -> Option<DayKey> {
    let victim = entries
        .iter()
        .filter(|(day, _)| *day != keep)
        .min_by_key(|(_, entry)| entry.last_access.load(Ordering::Relaxed))
        .map(|(day, _)| *day)?;
    entries.remove(&victim);
    Some(victim)
}

#[async_trait]
impl SnapshotCache for InMemoryCache {
    #[instrument(skip(self), fields(day = %day))]
    async fn get(&self, day: &DayKey) -> Result<Option<Arc<PerDaySnapshot>>> {
        let cache = self.entries.read().await;
        match cache.get(day) {
            Some(entry) if self.ttl.is_some_and(|ttl| entry.is_stale(ttl)) => {
                debug!("Cache entry expired");
                Ok(None)
            }
            Some(entry) => {
                entry.last_access.store(self.tick(), Ordering::Relaxed);
                debug!("Cache hit for snapshot");
                Ok(Some(Arc::clone(&entry.data)))
            }
            None => {
                debug!("Cache miss for snapshot");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, snapshot), fields(day = %day))]
    async fn put(&self, day: DayKey, snapshot: Arc<PerDaySnapshot>) -> Result<()> {
        let mut cache = self.entries.write().await;
        cache.insert(day, CacheEntry::new(snapshot, self.tick()));

        if let Some(capacity) = self.capacity {
            while cache.len() > capacity {
                match evict_lru(&mut cache, &day) {
                    Some(evicted) => debug!(evicted = %evicted, "Evicted least recently used day"),
                    None => break,
                }
            }
        }

        debug!("Cached snapshot");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
