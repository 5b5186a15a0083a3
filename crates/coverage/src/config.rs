//! Engine configuration.

use std::time::Duration;

use coverage_core::{DEFAULT_TREND_HORIZON_DAYS, TimeWindow};
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_TOP_ENTITIES;

/// Default number of fetches in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default per-fetch timeout in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Settings for a [`CoverageEngine`](crate::CoverageEngine).
///
/// Deserializable so embedders can load it from whatever format they already
/// use; every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum concurrent fetches (clamped to at least 1).
    pub max_concurrent: usize,
    /// Per-fetch timeout in milliseconds, applied after admission. `None` disables it.
    pub fetch_timeout_ms: Option<u64>,
    /// Window substituted for unknown window names.
    pub default_window: TimeWindow,
    /// Number of days in a trend series.
    pub trend_horizon_days: usize,
    /// Entities kept per country in a window.
    pub top_entities_limit: usize,
    /// LRU capacity of the in-memory cache. `None` keeps every day.
    pub cache_capacity: Option<usize>,
    /// Entry age limit of the in-memory cache in seconds. `None` never expires.
    pub cache_ttl_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            fetch_timeout_ms: Some(DEFAULT_FETCH_TIMEOUT_MS),
            default_window: TimeWindow::default(),
            trend_horizon_days: DEFAULT_TREND_HORIZON_DAYS,
            top_entities_limit: DEFAULT_TOP_ENTITIES,
            cache_capacity: None,
            cache_ttl_secs: None,
        }
    }
}

impl EngineConfig {
    /// Set the maximum number of concurrent fetches.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the per-fetch timeout.
    ///
    /// Timeouts beyond `u64::MAX` milliseconds saturate.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the fallback window.
    #[must_use]
    pub const fn with_default_window(mut self, window: TimeWindow) -> Self {
        self.default_window = window;
        self
    }

    /// Set the trend horizon.
    #[must_use]
    pub const fn with_trend_horizon(mut self, days: usize) -> Self {
        self.trend_horizon_days = days;
        self
    }

    /// Set the number of entities kept per country.
    #[must_use]
    pub const fn with_top_entities_limit(mut self, limit: usize) -> Self {
        self.top_entities_limit = limit;
        self
    }

    /// Bound the in-memory cache to `capacity` days.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Expire in-memory cache entries after `ttl`.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = Some(ttl.as_secs());
        self
    }

    /// Returns the per-fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the cache entry age limit.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
