//! Provider configuration, read at call time.
//!
//! The orchestrator asks its [`ConfigSource`] for a fresh [`ProviderConfig`]
//! on every request, so rotating the API key or base URL takes effect without
//! a process restart. The client adapter compares the returned values against
//! the last ones it used and rebuilds its HTTP client only when they changed.

use async_trait::async_trait;
use std::env;

/// Default upstream endpoint (OpenAI-compatible aggregator).
pub const DEFAULT_BASE_URL: &str = "https://api.aimlapi.com/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "google/gemma-3-12b-it";
/// Placeholder key used in development environments; treated as "not
/// configured" so the offline responder answers instead of the provider.
pub const DEV_PLACEHOLDER_KEY: &str = "fake-key-for-development";

/// Everything needed to reach the upstream provider for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Upstream API key. `None` means not configured.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Read configuration from the environment (`AI_API_KEY`, `AI_BASE_URL`,
    /// `AI_MODEL`), falling back to the defaults above.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("AI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    /// Whether a real credential is present. The development placeholder does
    /// not count: with it the orchestrator answers offline rather than
    /// sending a doomed request upstream.
    pub fn has_credentials(&self) -> bool {
        match &self.api_key {
            Some(key) => !key.is_empty() && key != DEV_PLACEHOLDER_KEY,
            None => false,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Host-supplied configuration lookup, consulted once per orchestration call.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn provider_config(&self) -> ProviderConfig;
}

/// [`ConfigSource`] backed by process environment variables.
pub struct EnvConfigSource;

#[async_trait]
impl ConfigSource for EnvConfigSource {
    async fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::from_env()
    }
}

/// Fixed configuration, mainly for tests and embedded setups.
#[derive(Debug, Clone)]
pub struct StaticConfigSource(pub ProviderConfig);

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn provider_config(&self) -> ProviderConfig {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_means_no_credentials() {
        let cfg = ProviderConfig::default();
        assert!(!cfg.has_credentials());
    }

    #[test]
    fn placeholder_key_means_no_credentials() {
        let cfg = ProviderConfig::new(
            Some(DEV_PLACEHOLDER_KEY.to_string()),
            DEFAULT_BASE_URL,
            DEFAULT_MODEL,
        );
        assert!(!cfg.has_credentials());
    }

    #[test]
    fn real_key_counts() {
        let cfg = ProviderConfig::new(Some("sk-test".into()), DEFAULT_BASE_URL, DEFAULT_MODEL);
        assert!(cfg.has_credentials());
    }
}
