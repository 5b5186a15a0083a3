//! Time windows and date range calculation.
//!
//! This module defines [`TimeWindow`] for the named aggregation spans and
//! [`DateRangeCalculator`] which turns a window or a fixed horizon into an
//! ordered list of [`DayKey`]s ending today.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoverageError;
use crate::types::DayKey;

/// Number of days in a country trend series.
pub const DEFAULT_TREND_HORIZON_DAYS: usize = 14;

/// Longest day range ever produced (ten years).
pub const MAX_RANGE_DAYS: usize = 3660;

/// Named span of days over which snapshots are aggregated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    /// Just today.
    #[serde(rename = "today")]
    Today,
    /// The last seven days including today.
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    /// The last thirty days including today.
    #[serde(rename = "30days")]
    ThirtyDays,
}

impl TimeWindow {
    /// Returns the number of calendar days in this window.
    #[must_use]
    pub const fn days(&self) -> usize {
        match self {
            Self::Today => 1,
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
        }
    }

    /// Returns the window's symbolic name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::SevenDays => "7days",
            Self::ThirtyDays => "30days",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "7days" => Ok(Self::SevenDays),
            "30days" => Ok(Self::ThirtyDays),
            other => Err(CoverageError::InvalidParameter(format!(
                "Unknown time window: {other}"
            ))),
        }
    }
}

/// Turns windows and horizons into ordered, gap-free day lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRangeCalculator {
    default_window: TimeWindow,
    trend_horizon_days: usize,
}

impl Default for DateRangeCalculator {
    fn default() -> Self {
        Self::new(TimeWindow::default(), DEFAULT_TREND_HORIZON_DAYS)
    }
}

impl DateRangeCalculator {
    /// Creates a calculator with a fallback window and a trend horizon.
    #[must_use]
    pub const fn new(default_window: TimeWindow, trend_horizon_days: usize) -> Self {
        Self {
            default_window,
            trend_horizon_days,
        }
    }

    /// Returns the window substituted for unknown names.
    #[must_use]
    pub const fn default_window(&self) -> TimeWindow {
        self.default_window
    }

    /// Returns the trend horizon in days.
    #[must_use]
    pub const fn trend_horizon_days(&self) -> usize {
        self.trend_horizon_days
    }

    /// Resolves a window name, falling back to the default window.
    #[must_use]
    pub fn resolve(&self, name: &str) -> TimeWindow {
        name.parse().unwrap_or(self.default_window)
    }

    /// Returns the days of a named window ending at `today`, oldest first.
    #[must_use]
    pub fn window_range(&self, name: &str, today: NaiveDate) -> Vec<DayKey> {
        days_ending(today, self.resolve(name).days())
    }

    /// Returns the days of the trend horizon ending at `today`, oldest first.
    #[must_use]
    pub fn trend_range(&self, today: NaiveDate) -> Vec<DayKey> {
        days_ending(today, self.trend_horizon_days)
    }

    /// Returns the process wall-clock date.
    #[must_use]
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Returns `days` consecutive calendar days ending at `end` inclusive, oldest first.
///
/// `days` is capped at [`MAX_RANGE_DAYS`]. Stops early only if the calendar
/// runs out before `NaiveDate::MIN`.
#[must_use]
pub fn days_ending(end: NaiveDate, days: usize) -> Vec<DayKey> {
    let days = days.min(MAX_RANGE_DAYS);
    let mut range = Vec::with_capacity(days);
    let mut current = Some(DayKey::new(end));
    for _ in 0..days {
        let Some(day) = current else { break };
        range.push(day);
        current = day.pred();
    }
    range.reverse();
    range
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_days() {
        assert_eq!(TimeWindow::Today.days(), 1);
        assert_eq!(TimeWindow::SevenDays.days(), 7);
        assert_eq!(TimeWindow::ThirtyDays.days(), 30);
    }

    #[test]
    fn test_window_parse() {
        assert_eq!("today".parse::<TimeWindow>().unwrap(), TimeWindow::Today);
        assert_eq!("30days".parse::<TimeWindow>().unwrap(), TimeWindow::ThirtyDays);
        assert!("90days".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_window_range_is_ordered_and_inclusive() {
        let calc = DateRangeCalculator::default();
        let range = calc.window_range("7days", date(2025, 3, 2));

        let rendered: Vec<String> = range.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "2025-02-24",
                "2025-02-25",
                "2025-02-26",
                "2025-02-27",
                "2025-02-28",
                "2025-03-01",
                "2025-03-02",
            ]
        );
    }

    #[test]
    fn test_today_window_is_single_day() {
        let calc = DateRangeCalculator::default();
        let range = calc.window_range("today", date(2025, 1, 1));
        assert_eq!(range, vec![DayKey::new(date(2025, 1, 1))]);
    }

    #[test]
    fn test_unknown_window_falls_back_to_default() {
        let calc = DateRangeCalculator::new(TimeWindow::Today, DEFAULT_TREND_HORIZON_DAYS);
        assert_eq!(calc.resolve("yesterday"), TimeWindow::Today);
        assert_eq!(calc.window_range("", date(2025, 1, 1)).len(), 1);

        let calc = DateRangeCalculator::default();
        assert_eq!(calc.window_range("bogus", date(2025, 1, 1)).len(), 7);
    }

    #[test]
    fn test_trend_range_spans_horizon() {
        let calc = DateRangeCalculator::new(TimeWindow::SevenDays, 14);
        let range = calc.trend_range(date(2024, 3, 5));
        assert_eq!(range.len(), 14);
        assert_eq!(range.first().unwrap().to_string(), "2024-02-21");
        assert_eq!(range.last().unwrap().to_string(), "2024-03-05");
        assert!(range.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_days_is_empty() {
        assert!(days_ending(date(2025, 1, 1), 0).is_empty());
    }

    #[test]
    fn test_huge_horizon_is_capped() {
        let calculator = DateRangeCalculator::new(TimeWindow::SevenDays, usize::MAX);
        let range = calculator.trend_range(date(2025, 1, 1));
        assert_eq!(range.len(), MAX_RANGE_DAYS);
        assert_eq!(range.last(), Some(&DayKey::new(date(2025, 1, 1))));
    }
}
