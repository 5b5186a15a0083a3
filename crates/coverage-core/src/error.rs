//! Error types for snapshot operations.
//!
//! [`FetchError`] is the tagged failure of a single day's load. It is returned as
//! a value inside [`FetchOutcome`] and never escalated past the aggregation layer.
//! [`CoverageError`] covers everything else (configuration, cache backends,
//! tabular export).

use std::sync::Arc;

use thiserror::Error;

use crate::types::{DayKey, PerDaySnapshot};

/// Failure kinds for a single day's load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The day has no published snapshot.
    NotFound,
    /// Transport or HTTP failure.
    NetworkError,
    /// The document exists but is structurally invalid.
    ValidationError,
    /// Anything that does not fit the other kinds.
    UnknownError,
}

/// Errors that can occur while loading one day's snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No snapshot is published for the day. Expected, not an error condition.
    #[error("No snapshot published for {0}")]
    NotFound(DayKey),

    /// Non-success HTTP status or a timed out fetch.
    #[error("Network error: {0}")]
    Network(String),

    /// The document failed structural validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uncategorized failure (transport errors, I/O errors).
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::NotFound(_) => FetchErrorKind::NotFound,
            Self::Network(_) => FetchErrorKind::NetworkError,
            Self::Validation(_) => FetchErrorKind::ValidationError,
            Self::Unknown(_) => FetchErrorKind::UnknownError,
        }
    }

    /// Returns true if this is the benign "no data for this day" case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result of loading one day: the shared snapshot or the reason it is missing.
pub type FetchOutcome = std::result::Result<Arc<PerDaySnapshot>, FetchError>;

/// Errors for operations outside the per-day fetch path.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error building a tabular export.
    #[error("Frame error: {0}")]
    Frame(String),
}

/// Result type alias using [`CoverageError`].
pub type Result<T> = std::result::Result<T, CoverageError>;
