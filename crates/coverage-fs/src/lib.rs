#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/coverage/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Local directory snapshot source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use coverage_core::{DayKey, FetchError, SnapshotSource, source::snapshot_file_name};
use serde_json::Value;
use tracing::debug;

/// Reads day snapshots from `map_<day>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory snapshots are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, day: &DayKey) -> PathBuf {
        self.root.join(snapshot_file_name(day))
    }
}

#[async_trait]
impl SnapshotSource for DirectorySource {
    fn name(&self) -> &str {
        "Directory"
    }

    async fn fetch_document(&self, day: &DayKey) -> Result<Value, FetchError> {
        let path = self.path_for(day);
        debug!("Reading snapshot: {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(*day),
            _ => FetchError::Unknown(format!("{}: {e}", path.display())),
        })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Validation(format!("{} is not JSON: {e}", path.display())))
    }
}
