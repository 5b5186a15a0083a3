//! Source trait for retrieving raw snapshot documents.
//!
//! A [`SnapshotSource`] knows where one day's document lives and how to read it.
//! It does not validate the document's structure or cache it; that is the
//! loader's job.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::FetchError, types::DayKey};

/// Retrieves the raw JSON document published for one day.
///
/// Implementations map their transport failures onto [`FetchError`]:
///
/// - missing document: [`FetchError::NotFound`]
/// - non-success status: [`FetchError::Network`]
/// - body that is not JSON: [`FetchError::Validation`]
/// - anything else: [`FetchError::Unknown`]
#[async_trait]
pub trait SnapshotSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "HTTP").
    fn name(&self) -> &str;

    /// Fetches the raw document for a day.
    async fn fetch_document(&self, day: &DayKey) -> Result<Value, FetchError>;
}

/// Returns the published file name for a day: `map_<YYYY-MM-DD>.json`.
#[must_use]
pub fn snapshot_file_name(day: &DayKey) -> String {
    format!("map_{day}.json")
}
