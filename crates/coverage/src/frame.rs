//! Tabular views over aggregates and trends.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use coverage_core::{CountryCode, CoverageError, Result, TrendPoint, WindowedAggregate};
use polars::prelude::*;

fn days_since_epoch(date: NaiveDate) -> Result<i32> {
    let days = (date - NaiveDate::default()).num_days();
    i32::try_from(days).map_err(|e| CoverageError::Frame(e.to_string()))
}

/// Build a `date | featured | covering` frame from a trend series.
///
/// # Errors
///
/// Returns [`CoverageError::Frame`] if the frame cannot be assembled.
pub fn trend_frame(points: &[TrendPoint]) -> Result<DataFrame> {
    let dates = points
        .iter()
        .map(|p| days_since_epoch(p.date.date()))
        .collect::<Result<Vec<i32>>>()?;
    let featured: Vec<f64> = points.iter().map(|p| p.featured).collect();
    let covering: Vec<f64> = points.iter().map(|p| p.covering).collect();

    let date_col = Column::new("date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| CoverageError::Frame(e.to_string()))?;

    DataFrame::new(vec![
        date_col,
        Column::new("featured".into(), featured),
        Column::new("covering".into(), covering),
    ])
    .map_err(|e| CoverageError::Frame(e.to_string()))
}

/// Build a per-country frame of the aggregate's share maps.
///
/// One row per country present in any of the three maps, sorted by code.
/// Countries missing from a map get a null in that column.
///
/// # Errors
///
/// Returns [`CoverageError::Frame`] if the frame cannot be assembled.
pub fn share_frame(aggregate: &WindowedAggregate) -> Result<DataFrame> {
    let countries: BTreeSet<&CountryCode> = aggregate
        .import_share
        .keys()
        .chain(aggregate.export_share.keys())
        .chain(aggregate.mention_share.keys())
        .collect();

    let codes: Vec<&str> = countries.iter().map(|c| c.as_str()).collect();
    let column = |map: &coverage_core::ShareMap| -> Vec<Option<f64>> {
        countries.iter().map(|c| map.get(*c).copied()).collect()
    };

    DataFrame::new(vec![
        Column::new("country".into(), codes),
        Column::new("import_share".into(), column(&aggregate.import_share)),
        Column::new("export_share".into(), column(&aggregate.export_share)),
        Column::new("mention_share".into(), column(&aggregate.mention_share)),
    ])
    .map_err(|e| CoverageError::Frame(e.to_string()))
}
