//! Per-country trend series.

use chrono::NaiveDate;
use coverage_core::{CountryCode, DayKey, TrendPoint, window::days_ending};
use tracing::{debug, instrument};

use crate::collect::substitute_missing;
use crate::loader::SnapshotLoader;

/// Builds dense featured/covering series for one country.
///
/// Every requested day yields exactly one point. Days that fail to load, and
/// days where the country is absent, contribute zeros.
#[derive(Debug, Clone)]
pub struct TrendBuilder {
    loader: SnapshotLoader,
}

impl TrendBuilder {
    /// Create a builder reading days through `loader`.
    #[must_use]
    pub const fn new(loader: SnapshotLoader) -> Self {
        Self { loader }
    }

    /// Build a series of `horizon_days` points ending at `today`, oldest first.
    pub async fn build_trend(
        &self,
        country: &CountryCode,
        horizon_days: usize,
        today: NaiveDate,
    ) -> Vec<TrendPoint> {
        self.build(country, &days_ending(today, horizon_days)).await
    }

    /// Build one point per day in `days`, in the given order.
    #[instrument(skip_all, fields(country = %country, days = days.len()))]
    pub async fn build(&self, country: &CountryCode, days: &[DayKey]) -> Vec<TrendPoint> {
        let outcomes = self.loader.load_many(days).await;
        let available = outcomes.iter().filter(|(_, o)| o.is_ok()).count();

        let points = substitute_missing(
            outcomes,
            |day, snapshot| {
                TrendPoint::new(
                    day,
                    snapshot.foreign_press.featured_total(country),
                    snapshot.foreign_press.covering_total(country),
                )
            },
            TrendPoint::zero,
        );

        debug!(available, "Built trend");
        points
    }
}
