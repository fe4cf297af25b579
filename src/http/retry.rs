//! Retry policy applied by callers around a fetch.
//!
//! The HTTP client itself never retries. A [`RetryPolicy`] with a single
//! attempt (the default) reproduces one GET per install.

use anyhow::Result;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;

use crate::error::{LauncherError, find_launcher_error};

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Zero is treated as one.
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

impl RetryPolicy {
    pub fn once() -> Self {
        Self::with_attempts(1)
    }

    pub fn with_attempts(attempts: usize) -> Self {
        Self {
            attempts,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// Transport failures, including a body cut off mid-transfer, and 5xx
/// responses may succeed later; client errors, empty bodies and local
/// failures will not.
pub fn is_retryable(error: &anyhow::Error) -> bool {
    match find_launcher_error(error) {
        Some(LauncherError::Download { status: None, .. }) => true,
        Some(LauncherError::Download {
            status: Some(status),
            ..
        }) => *status >= 500,
        Some(LauncherError::Write { .. }) => is_interrupted_transfer(error),
        _ => false,
    }
}

/// The body stopped arriving, as opposed to the local write failing.
fn is_interrupted_transfer(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|e| e.is_body() || e.is_decode() || e.is_timeout())
}

/// Executes an async operation under `policy`.
pub async fn with_retry<F, Fut, T>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable(&e) {
                    debug!("{}: non-retryable error: {:#}", operation_name, e);
                    return Err(e);
                }
                if attempt >= attempts {
                    return Err(e);
                }

                warn!(
                    "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                    operation_name,
                    attempt,
                    attempts,
                    e,
                    policy.delay.as_millis()
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
