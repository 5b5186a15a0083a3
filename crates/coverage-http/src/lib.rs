#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/coverage/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! HTTP snapshot source.
//!
//! This crate provides [`HttpSource`], an implementation of the
//! [`SnapshotSource`] trait from `coverage-core` that fetches one immutable
//! JSON document per day from a static file host.
//!
//! # Example
//!
//! ```no_run
//! use coverage_http::HttpSource;
//! use coverage_core::{DayKey, SnapshotSource};
//!
//! # async fn example() -> Result<(), coverage_core::FetchError> {
//! let source = HttpSource::new("https://coverage.example.org");
//! let day: DayKey = "2025-05-12".parse().expect("valid day");
//!
//! let document = source.fetch_document(&day).await?;
//! println!("{} top-level fields", document.as_object().map_or(0, |o| o.len()));
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use coverage_core::{DayKey, FetchError, SnapshotSource, source::snapshot_file_name};
use serde_json::Value;
use tracing::debug;

/// Path under the base URL where day snapshots are published.
const SNAPSHOT_PATH: &str = "data/world_map";

/// Default client-level request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent for HTTP requests.
const USER_AGENT: &str = concat!("coverage-http/", env!("CARGO_PKG_VERSION"));

/// Reads published day snapshots from a static HTTP host.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Create a new HTTP source for the given base URL.
    ///
    /// Uses a client-level timeout of 30 seconds.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new HTTP source with a custom client-level timeout.
    #[must_use]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(base_url, client)
    }

    /// Create a new HTTP source with a custom HTTP client.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the base URL snapshots are fetched from.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the snapshot URL for a day.
    fn build_url(&self, day: &DayKey) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            SNAPSHOT_PATH,
            snapshot_file_name(day)
        )
    }
}

/// Maps a transport error onto the fetch taxonomy.
fn transport_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Network(format!("Request timed out: {e}"))
    } else {
        FetchError::Unknown(e.to_string())
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_document(&self, day: &DayKey) -> Result<Value, FetchError> {
        let url = self.build_url(day);
        debug!("Fetching snapshot: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(*day));
        }

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                day
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Validation(format!("Body for {day} is not JSON: {e}"))
            } else {
                transport_error(&e)
            }
        })
    }
}
