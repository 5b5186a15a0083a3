//! Collection strategies for per-day outcomes.
//!
//! Windows and trends both tolerate failed days but treat them differently:
//!
//! - [`filter_available`] drops failed days, so a window's averages only count
//!   days that had data
//! - [`substitute_missing`] replaces failed days with a fallback value, so a
//!   trend keeps one entry per requested day

use std::sync::Arc;

use coverage_core::{DayKey, FetchOutcome, PerDaySnapshot};

/// Keeps the snapshots of successful days, in input order.
#[must_use]
pub fn filter_available(outcomes: Vec<(DayKey, FetchOutcome)>) -> Vec<Arc<PerDaySnapshot>> {
    outcomes
        .into_iter()
        .filter_map(|(_, outcome)| outcome.ok())
        .collect()
}

/// Maps every day to a value, using `fallback` for failed days.
///
/// The output has exactly one entry per input day, in input order.
pub fn substitute_missing<T>(
    outcomes: Vec<(DayKey, FetchOutcome)>,
    mut present: impl FnMut(DayKey, &PerDaySnapshot) -> T,
    mut fallback: impl FnMut(DayKey) -> T,
) -> Vec<T> {
    outcomes
        .into_iter()
        .map(|(day, outcome)| match outcome {
            Ok(snapshot) => present(day, &snapshot),
            Err(_) => fallback(day),
        })
        .collect()
}
