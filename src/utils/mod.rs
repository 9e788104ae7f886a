//! Utility modules supporting extraction operations.
//!
//! - [`dedup_by_key`]: stable key-based duplicate removal for listing results
//! - [`HttpClient`]: shared HTTP client with sensible defaults
//! - [`RetryConfig`] / [`with_retry`]: bounded retry with exponential backoff
//!   for transient transport failures

mod dedup;
mod http;
mod retry;

pub use dedup::dedup_by_key;
pub use http::HttpClient;
pub use retry::{is_transient, transport_retry_config, with_retry, RetryConfig};
