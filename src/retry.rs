//! Retry logic with exponential backoff for the bulk source fetches
//!
//! Only the batch-level fetches (snapshot, release list, architecture check)
//! go through here. Per-package searches are never retried: a failed search
//! degrades one record and the rate limit makes extra attempts expensive.
//!
//! # Example
//!
//! ```no_run
//! use pkgcheck::retry::fetch_with_retry;
//! use pkgcheck::config::RetryConfig;
//! use pkgcheck::error::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = fetch_with_retry(&config, "release list", || async {
//!     Ok::<String, Error>("0.74.0\n0.73.6".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, SourceError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient (worth another attempt) or permanent
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Error::Source(SourceError::Timeout { .. }) => true,
            // 5xx and 429 are upstream hiccups, everything else is a real answer
            Error::Source(SourceError::HttpStatus { status, .. }) => {
                *status >= 500 || *status == 429
            }
            Error::Source(SourceError::MalformedPayload { .. }) => false,
            Error::Source(SourceError::InvalidLink { .. }) => false,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::Serialization(_)
            | Error::Manifest(_)
            | Error::InvalidInput(_)
            | Error::Superseded { .. }
            | Error::ApiServerError(_)
            | Error::Other(_) => false,
        }
    }
}

/// Execute an async fetch with exponential backoff retry logic
///
/// `label` names the source in log output. Returns the successful result or
/// the last error after all retry attempts are exhausted.
pub async fn fetch_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        source = label,
                        attempts = attempt + 1,
                        "fetch succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    source = label,
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "fetch failed, retrying"
                );

                let wait = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };
                tokio::time::sleep(wait).await;

                let next_delay =
                    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                        .unwrap_or(config.max_delay);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                tracing::debug!(
                    source = label,
                    error = %e,
                    attempts = attempt + 1,
                    retryable = e.is_retryable(),
                    "fetch giving up"
                );
                return Err(e);
            }
        }
    }
}

/// Add up to 100% random jitter to a delay (result lies in `delay..=2*delay`)
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
