//! Fixed-interval dispatch for rate-limited upstream calls
//!
//! The directory search endpoint only tolerates a limited request rate. The
//! [`RequestPacer`] hands out dispatch slots spaced at least `interval` apart
//! and caps how many calls may be in flight at once, so the aggregate rate
//! never exceeds `1 / interval` regardless of the concurrency setting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

/// Rate-limited task queue shared by every search a checker dispatches
///
/// Cloning is cheap; clones share the same schedule.
#[derive(Clone, Debug)]
pub struct RequestPacer {
    /// Minimum spacing between consecutive dispatches
    interval: Duration,
    /// Earliest instant the next dispatch may start
    next_slot: Arc<Mutex<Option<Instant>>>,
    /// In-flight cap
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

/// Permission to run one paced call; the in-flight slot is released on drop
#[derive(Debug)]
pub struct PacerPermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestPacer {
    /// Create a pacer; `max_concurrent` is raised to at least 1
    ///
    /// # Examples
    ///
    /// ```
    /// use pkgcheck::pacer::RequestPacer;
    /// use std::time::Duration;
    ///
    /// // one call every 100 ms, strictly sequential
    /// let pacer = RequestPacer::new(Duration::from_millis(100), 1);
    /// assert_eq!(pacer.max_concurrent(), 1);
    /// ```
    #[must_use]
    pub fn new(interval: Duration, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            interval,
            next_slot: Arc::new(Mutex::new(None)),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Build from the search section of the configuration
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.min_interval, config.max_concurrent)
    }

    /// Configured spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Configured in-flight cap
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Wait for an in-flight slot and the next dispatch time
    ///
    /// The in-flight slot is taken first so a waiting task never reserves a
    /// dispatch time it cannot use yet.
    pub async fn acquire(&self) -> Result<PacerPermit> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Other("request pacer closed".to_string()))?;

        let wait = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let start = next.map_or(now, |slot| slot.max(now));
            *next = Some(start + self.interval);
            start - now
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        Ok(PacerPermit { _permit: permit })
    }
}
