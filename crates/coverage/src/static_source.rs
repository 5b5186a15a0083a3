//! In-memory scripted source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use coverage_core::{DayKey, FetchError, SnapshotSource};
use serde_json::Value;
use tracing::trace;

/// A source serving fixed documents and failures from memory.
///
/// Days without a scripted response report [`FetchError::NotFound`]. Every call
/// is counted, which makes it useful for testing cache behaviour and for
/// serving snapshots assembled in-process.
#[derive(Debug, Default)]
pub struct StaticSource {
    responses: HashMap<DayKey, Result<Value, FetchError>>,
    latency: Option<Duration>,
    requests: AtomicUsize,
    per_day: Mutex<HashMap<DayKey, usize>>,
}

impl StaticSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for `day`.
    #[must_use]
    pub fn with_document(mut self, day: DayKey, document: Value) -> Self {
        self.responses.insert(day, Ok(document));
        self
    }

    /// Fail every fetch of `day` with `error`.
    #[must_use]
    pub fn with_failure(mut self, day: DayKey, error: FetchError) -> Self {
        self.responses.insert(day, Err(error));
        self
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the total number of fetches served.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns the number of fetches served for one day.
    #[must_use]
    pub fn requests_for(&self, day: &DayKey) -> usize {
        self.per_day
            .lock()
            .map(|counts| counts.get(day).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl SnapshotSource for StaticSource {
    fn name(&self) -> &str {
        "Static"
    }

    async fn fetch_document(&self, day: &DayKey) -> Result<Value, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut counts) = self.per_day.lock() {
            *counts.entry(*day).or_insert(0) += 1;
        }
        trace!(day = %day, "Static source fetch");

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.responses
            .get(day)
            .cloned()
            .unwrap_or(Err(FetchError::NotFound(*day)))
    }
}
