//! Bounded-parallelism admission control.
//!
//! [`ConcurrencyLimiter`] admits at most `max_concurrent` tasks at once and
//! queues the rest in submission order. It knows nothing about the tasks it
//! runs; a failed task releases its slot like a successful one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::trace;

use crate::config::DEFAULT_MAX_CONCURRENT;

/// Reasons the limiter could not deliver a task's own outcome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitError {
    /// The task ran past the per-task timeout and was dropped.
    #[error("Task timed out after {0:?}")]
    TimedOut(Duration),

    /// The limiter was closed before the task was admitted.
    #[error("Limiter closed")]
    Closed,
}

/// FIFO admission gate for asynchronous tasks.
///
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Option<Duration>,
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting `max_concurrent` tasks.
    ///
    /// The width is clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            timeout: None,
        }
    }

    /// Drop any admitted task that runs longer than `timeout`, freeing its slot.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the maximum number of tasks running at once.
    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns the per-task timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the number of tasks currently admitted.
    #[must_use]
    pub fn running(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Runs `task` once a slot is free and returns its output.
    ///
    /// Waiting tasks are admitted in the order they called `execute`. The
    /// timeout, if configured, only covers the time after admission.
    pub async fn execute<F, T>(&self, task: F) -> Result<T, LimitError>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| LimitError::Closed)?;
        trace!(running = self.running(), "Task admitted");

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| LimitError::TimedOut(limit)),
            None => Ok(task.await),
        }
    }

    /// Stops admitting tasks; queued and future calls fail with [`LimitError::Closed`].
    pub fn close(&self) {
        self.semaphore.close();
    }
}
