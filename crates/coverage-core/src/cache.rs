//! Cache trait for storing validated snapshots.
//!
//! This module defines the [`SnapshotCache`] trait, a key/value store from
//! [`DayKey`] to validated [`PerDaySnapshot`]. Only successful loads are stored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{DayKey, PerDaySnapshot},
};

/// Trait for caching validated day snapshots.
///
/// Snapshots are shared behind [`Arc`] so a hit never copies the document.
/// Implementations must tolerate concurrent misses for the same day followed
/// by two `put`s; the later write simply replaces an identical value.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Retrieves a cached snapshot.
    ///
    /// Returns `Ok(Some(snapshot))` if cached, `Ok(None)` if not cached.
    async fn get(&self, day: &DayKey) -> Result<Option<Arc<PerDaySnapshot>>>;

    /// Stores a snapshot, replacing any existing entry for the day.
    async fn put(&self, day: DayKey, snapshot: Arc<PerDaySnapshot>) -> Result<()>;

    /// Returns the number of cached days.
    async fn len(&self) -> usize;

    /// Returns true if nothing is cached.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
