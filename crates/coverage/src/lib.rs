#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/coverage/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Daily coverage snapshot aggregation engine.
//!
//! This crate re-exports the core types and the source/cache implementations,
//! and provides [`CoverageEngine`] with the entry points consumed by the
//! dashboard: [`load_window`](CoverageEngine::load_window),
//! [`load_trend`](CoverageEngine::load_trend) and
//! [`clear_cache`](CoverageEngine::clear_cache).
//!
//! The pieces underneath are usable on their own:
//!
//! - [`ConcurrencyLimiter`] - FIFO admission gate for concurrent fetches
//! - [`SnapshotLoader`] - cache-first, limiter-bounded, validating day loader
//! - [`Aggregator`] - combines day snapshots into a [`WindowedAggregate`]
//! - [`TrendBuilder`] - dense per-country [`TrendPoint`] series

// Core types and traits
pub use coverage_core::*;

// Cache implementations
pub use coverage_cache::{InMemoryCache, NoopCache};

// Sources
#[cfg(feature = "fs")]
pub use coverage_fs::DirectorySource;
#[cfg(feature = "http")]
pub use coverage_http::HttpSource;

/// Combining day snapshots into a window summary.
pub mod aggregate;
/// Collection strategies for per-day outcomes.
pub mod collect;
/// Engine configuration.
pub mod config;
/// Public entry points.
pub mod engine;
/// Tabular export of results.
pub mod frame;
/// Bounded-parallelism admission control.
pub mod limiter;
/// Cache-first, validating day loader.
pub mod loader;
/// In-memory scripted source.
pub mod static_source;
/// Per-country trend series.
pub mod trend;
/// Structural validation of raw day documents.
pub mod validate;

pub use aggregate::Aggregator;
pub use config::EngineConfig;
pub use engine::CoverageEngine;
pub use frame::{share_frame, trend_frame};
pub use limiter::{ConcurrencyLimiter, LimitError};
pub use loader::SnapshotLoader;
pub use static_source::StaticSource;
pub use trend::TrendBuilder;
pub use validate::parse_snapshot;
