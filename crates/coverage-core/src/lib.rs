#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/coverage/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for daily coverage snapshots.
//!
//! This crate provides the foundational abstractions for the snapshot engine:
//!
//! - [`SnapshotSource`](source::SnapshotSource) - Retrieves one day's raw document
//! - [`SnapshotCache`](cache::SnapshotCache) - Caching abstraction for validated days
//! - [`DateRangeCalculator`](window::DateRangeCalculator) - Window name to day keys
//! - [`PerDaySnapshot`](types::PerDaySnapshot) and [`WindowedAggregate`](types::WindowedAggregate)

/// Cache trait for storing validated snapshots.
pub mod cache;
/// Error types for snapshot operations.
pub mod error;
/// Source trait for retrieving raw snapshot documents.
pub mod source;
/// Core data types (DayKey, CountryCode, snapshots, trend points).
pub mod types;
/// Time windows and date range calculation.
pub mod window;

// Re-export commonly used items at crate root
pub use cache::SnapshotCache;
pub use error::{CoverageError, FetchError, FetchErrorKind, FetchOutcome, Result};
pub use source::SnapshotSource;
pub use types::{
    CountryCode, CoverageRelation, DayKey, EntityCount, ForeignPress, PerDaySnapshot,
    RankingEntry, ShareMap, TrendPoint, WindowedAggregate,
};
pub use window::{DEFAULT_TREND_HORIZON_DAYS, DateRangeCalculator, MAX_RANGE_DAYS, TimeWindow};
