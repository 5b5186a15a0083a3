//! Cache-first, validating day loader.

use std::fmt;
use std::sync::Arc;

use coverage_core::{
    DayKey, FetchError, FetchOutcome, Result, SnapshotCache, SnapshotSource,
};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::limiter::{ConcurrencyLimiter, LimitError};
use crate::validate::parse_snapshot;

/// Loads validated day snapshots, consulting the cache before the source.
///
/// Cache hits bypass the limiter entirely. Misses are fetched through the
/// limiter, validated, and cached on success only; failures are returned as
/// values and nothing negative is remembered, so a later call retries.
///
/// Concurrent misses for the same day may both fetch; the second `put`
/// replaces an identical snapshot.
#[derive(Clone)]
pub struct SnapshotLoader {
    source: Arc<dyn SnapshotSource>,
    cache: Arc<dyn SnapshotCache>,
    limiter: ConcurrencyLimiter,
}

impl fmt::Debug for SnapshotLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotLoader")
            .field("source", &self.source.name())
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl SnapshotLoader {
    /// Create a loader over a source, a cache and a limiter.
    #[must_use]
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        cache: Arc<dyn SnapshotCache>,
        limiter: ConcurrencyLimiter,
    ) -> Self {
        Self {
            source,
            cache,
            limiter,
        }
    }

    /// Returns the source documents are fetched from.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn SnapshotSource> {
        &self.source
    }

    /// Returns the snapshot cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn SnapshotCache> {
        &self.cache
    }

    /// Returns the fetch limiter.
    #[must_use]
    pub const fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Load one day's snapshot.
    #[instrument(skip_all, fields(day = %day, source = self.source.name()))]
    pub async fn load(&self, day: &DayKey) -> FetchOutcome {
        match self.cache.get(day).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cache lookup failed, fetching"),
        }

        let document = match self.limiter.execute(self.source.fetch_document(day)).await {
            Ok(result) => result,
            Err(LimitError::TimedOut(limit)) => Err(FetchError::Network(format!(
                "Fetch for {day} timed out after {limit:?}"
            ))),
            Err(LimitError::Closed) => Err(FetchError::Unknown(format!(
                "Fetch for {day} rejected: limiter closed"
            ))),
        };

        let outcome = document.and_then(|doc| parse_snapshot(&doc)).map(Arc::new);

        match &outcome {
            Ok(snapshot) => {
                if let Err(e) = self.cache.put(*day, Arc::clone(snapshot)).await {
                    warn!(error = %e, "Failed to cache snapshot");
                }
                debug!("Loaded snapshot");
            }
            Err(e) if e.is_not_found() => debug!("No snapshot published"),
            Err(e) => warn!(error = %e, "Failed to load snapshot"),
        }

        outcome
    }

    /// Load several days concurrently, returning outcomes in input order.
    pub async fn load_many(&self, days: &[DayKey]) -> Vec<(DayKey, FetchOutcome)> {
        join_all(
            days.iter()
                .map(|day| async move { (*day, self.load(day).await) }),
        )
        .await
    }

    /// Drop every cached day so the next load fetches again.
    ///
    /// # Errors
    ///
    /// Returns the cache backend's error.
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }
}
