//! Retry logic with exponential backoff
//!
//! Each retry of an upload runs a fresh attempt; nothing from a failed
//! attempt carries over except the task's cancellation flag.
//!
//! # Example
//!
//! ```no_run
//! use upload_service::retry::{IsRetryable, upload_with_retry};
//! use upload_service::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! upload_with_retry(&config, || async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, refused or reset connections) return `true`.
/// Failures the caller has to fix (bad configuration, unknown scheme,
/// missing source) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            // The abstract transport only reports failures below HTTP
            Error::Transport(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Error::Config { .. } => false,
            Error::UnsupportedScheme { .. } => false,
            Error::SourceUnavailable { .. } => false,
            Error::Serialization(_) => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// `max_attempts` counts retries, so the operation runs at most
/// `max_attempts + 1` times. Non-retryable errors are returned immediately.
pub async fn upload_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut retries = 0;
    let mut delay = config.initial_delay;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(retries, "upload went through after retrying");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !error.is_retryable() {
            tracing::error!(error = %error, "upload failed, not retrying");
            return Err(error);
        }
        if retries >= config.max_attempts {
            tracing::error!(error = %error, retries, "upload failed, out of retries");
            return Err(error);
        }

        retries += 1;
        let wait = if config.jitter {
            add_jitter(delay)
        } else {
            delay
        };
        tracing::warn!(
            error = %error,
            retry = retries,
            max_retries = config.max_attempts,
            wait_ms = wait.as_millis() as u64,
            "upload attempt failed"
        );
        tokio::time::sleep(wait).await;
        delay = next_delay(config, delay);
    }
}

/// Grow `current` by the backoff multiplier, capped at `max_delay`
fn next_delay(config: &RetryConfig, current: Duration) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * config.backoff_multiplier)
        .map_or(config.max_delay, |grown| grown.min(config.max_delay))
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The returned delay is uniformly distributed between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
