//! No-op cache implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coverage_core::{DayKey, PerDaySnapshot, Result, SnapshotCache};
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and `put` always returns `Ok(())`, so every
/// load goes to the source. Useful for disabling caching or exercising the
/// fetch path in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotCache for NoopCache {
    async fn get(&self, day: &DayKey) -> Result<Option<Arc<PerDaySnapshot>>> {
        trace!(day = %day, "Caching disabled, reporting miss");
        Ok(None)
    }

    async fn put(&self, day: DayKey, _snapshot: Arc<PerDaySnapshot>) -> Result<()> {
        trace!(day = %day, "Caching disabled, dropping snapshot");
        Ok(())
    }

    async fn len(&self) -> usize {
        0
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_is_forgotten() {
        let cache = NoopCache::new();
        let day: DayKey = "2025-01-01".parse().unwrap();

        cache
            .put(day, Arc::new(PerDaySnapshot::default()))
            .await
            .unwrap();

        assert!(cache.get(&day).await.unwrap().is_none());
        assert!(cache.is_empty().await);
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
        cache.clear().await.unwrap();
    }
}
