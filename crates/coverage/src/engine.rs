//! Public entry points consumed by the dashboard.

use std::sync::Arc;

use chrono::NaiveDate;
use coverage_cache::InMemoryCache;
use coverage_core::{
    CountryCode, DateRangeCalculator, MAX_RANGE_DAYS, SnapshotCache, SnapshotSource, TrendPoint,
    WindowedAggregate,
};
use tracing::{debug, info, instrument, warn};

use crate::aggregate::Aggregator;
use crate::collect::filter_available;
use crate::config::EngineConfig;
use crate::limiter::ConcurrencyLimiter;
use crate::loader::SnapshotLoader;
use crate::trend::TrendBuilder;

/// Snapshot aggregation engine.
///
/// Owns its cache, so independent engines never share state. None of the entry
/// points return errors: failed days are dropped from windows and zeroed in
/// trends, and a window without any data comes back empty.
///
/// # Example
///
/// ```rust,ignore
/// use coverage::{CountryCode, CoverageEngine, EngineConfig};
///
/// let engine = CoverageEngine::http("https://coverage.example.org", EngineConfig::default());
///
/// let month = engine.load_window("30days").await;
/// if month.is_empty() {
///     println!("no data in the last 30 days");
/// }
///
/// let trend = engine.load_trend(&CountryCode::new("DEU")).await;
/// assert_eq!(trend.len(), 14);
/// ```
#[derive(Debug, Clone)]
pub struct CoverageEngine {
    loader: SnapshotLoader,
    calculator: DateRangeCalculator,
    aggregator: Aggregator,
    config: EngineConfig,
}

impl CoverageEngine {
    /// Create an engine over `source` with an in-memory cache sized by `config`.
    #[must_use]
    pub fn new(source: Arc<dyn SnapshotSource>, config: EngineConfig) -> Self {
        let mut cache = InMemoryCache::new();
        if let Some(capacity) = config.cache_capacity {
            cache = cache.with_capacity(capacity);
        }
        if let Some(ttl) = config.cache_ttl() {
            cache = cache.with_ttl(ttl);
        }
        Self::with_cache(source, Arc::new(cache), config)
    }

    /// Create an engine over `source` using the given cache.
    #[must_use]
    pub fn with_cache(
        source: Arc<dyn SnapshotSource>,
        cache: Arc<dyn SnapshotCache>,
        config: EngineConfig,
    ) -> Self {
        let mut limiter = ConcurrencyLimiter::new(config.max_concurrent);
        if let Some(timeout) = config.fetch_timeout() {
            limiter = limiter.with_timeout(timeout);
        }

        if limiter.max_concurrent() != config.max_concurrent {
            warn!(
                requested = config.max_concurrent,
                max_concurrent = limiter.max_concurrent(),
                "Clamped fetch concurrency"
            );
        }
        if config.trend_horizon_days > MAX_RANGE_DAYS {
            warn!(
                requested = config.trend_horizon_days,
                max = MAX_RANGE_DAYS,
                "Trend horizon capped"
            );
        }

        debug!(
            source = source.name(),
            max_concurrent = limiter.max_concurrent(),
            "Creating coverage engine"
        );

        Self {
            loader: SnapshotLoader::new(source, cache, limiter),
            calculator: DateRangeCalculator::new(config.default_window, config.trend_horizon_days),
            aggregator: Aggregator::new(config.top_entities_limit),
            config,
        }
    }

    /// Create an engine reading snapshots over HTTP from `base_url`.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http(base_url: &str, config: EngineConfig) -> Self {
        Self::new(Arc::new(coverage_http::HttpSource::new(base_url)), config)
    }

    /// Create an engine reading snapshots from a local directory.
    #[cfg(feature = "fs")]
    #[must_use]
    pub fn directory(root: impl Into<std::path::PathBuf>, config: EngineConfig) -> Self {
        Self::new(Arc::new(coverage_fs::DirectorySource::new(root)), config)
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the day loader.
    #[must_use]
    pub const fn loader(&self) -> &SnapshotLoader {
        &self.loader
    }

    /// Returns the date range calculator.
    #[must_use]
    pub const fn calculator(&self) -> &DateRangeCalculator {
        &self.calculator
    }

    /// Aggregate the named window ending today.
    ///
    /// Unknown names fall back to the configured default window.
    pub async fn load_window(&self, window: &str) -> WindowedAggregate {
        self.load_window_ending(window, DateRangeCalculator::today())
            .await
    }

    /// Aggregate the named window ending at `today`.
    #[instrument(skip(self))]
    pub async fn load_window_ending(&self, window: &str, today: NaiveDate) -> WindowedAggregate {
        let date_range = self.calculator.window_range(window, today);
        let outcomes = self.loader.load_many(&date_range).await;
        let snapshots = filter_available(outcomes);

        if snapshots.is_empty() {
            warn!(days = date_range.len(), "No usable days in window");
        }

        self.aggregator.aggregate(&snapshots, date_range)
    }

    /// Build the trend series for `country` ending today.
    pub async fn load_trend(&self, country: &CountryCode) -> Vec<TrendPoint> {
        self.load_trend_ending(country, DateRangeCalculator::today())
            .await
    }

    /// Build the trend series for `country` ending at `today`.
    pub async fn load_trend_ending(
        &self,
        country: &CountryCode,
        today: NaiveDate,
    ) -> Vec<TrendPoint> {
        let days = self.calculator.trend_range(today);
        TrendBuilder::new(self.loader.clone())
            .build(country, &days)
            .await
    }

    /// Drop every cached day so subsequent requests fetch again.
    ///
    /// Cache backend failures are logged, not returned.
    pub async fn clear_cache(&self) {
        match self.loader.clear_cache().await {
            Ok(()) => info!("Cleared snapshot cache"),
            Err(e) => warn!(error = %e, "Failed to clear snapshot cache"),
        }
    }
}
