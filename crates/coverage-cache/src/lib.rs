#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/coverage/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for coverage snapshots.
//!
//! This crate provides implementations of the [`SnapshotCache`] trait from `coverage-core`:
//!
//! - [`InMemoryCache`] - In-memory cache with optional LRU capacity and TTL
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use coverage_core::SnapshotCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;
