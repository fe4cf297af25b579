//! HTTP client and caller-level retry policy.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{RetryPolicy, is_retryable, with_retry};
