//! # Provider Client Module
//!
//! The network-facing half of the orchestration layer: a lazily rebuilt
//! HTTP client bound to the current provider configuration, plus the retry
//! executor that wraps each upstream call with exponential backoff.

mod provider;
mod retry;

pub use provider::ProviderClient;
pub use retry::{retry_with_backoff, RetryPolicy};
