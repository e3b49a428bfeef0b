//! Composition root: the per-message orchestration sequence.
//!
//! One call walks: resolve persona → build cache key → cache lookup → quota
//! check → credentials check → retried provider call → write-through. The
//! offline responder substitutes at exactly two decision points: when no real
//! credential is configured (reply is cached) and when the provider call
//! ultimately fails for any reason other than quota exhaustion (reply is not
//! cached).
//!
//! Error policy: only [`Error::QuotaExceeded`] leaves this module as an
//! error. Everything else is absorbed so the end user always receives a
//! message.

use crate::cache::{CacheKeyBuilder, MemoryCache, ReplyCache};
use crate::client::{retry_with_backoff, ProviderClient, RetryPolicy};
use crate::config::{ConfigSource, EnvConfigSource};
use crate::offline::OfflineResponder;
use crate::resilience::{QuotaConfig, QuotaTracker};
use crate::types::{AiReply, ChatTurn, Persona};
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// Host-supplied lookup for the active persona (the "active prompt" in the
/// dashboard's configuration store).
#[async_trait]
pub trait PersonaSource: Send + Sync {
    async fn active_persona(&self) -> Result<Option<Persona>>;
}

/// [`PersonaSource`] for hosts without persona support: never any persona.
pub struct NoPersona;

#[async_trait]
impl PersonaSource for NoPersona {
    async fn active_persona(&self) -> Result<Option<Persona>> {
        Ok(None)
    }
}

/// Fixed persona, mainly for tests and embedded setups.
#[derive(Debug, Clone)]
pub struct StaticPersona(pub Option<Persona>);

#[async_trait]
impl PersonaSource for StaticPersona {
    async fn active_persona(&self) -> Result<Option<Persona>> {
        Ok(self.0.clone())
    }
}

/// The AI request orchestration layer.
///
/// Stateless across calls except for the shared quota window and response
/// cache; safe to share behind an `Arc` across concurrent callers.
pub struct Orchestrator {
    cache: ReplyCache,
    quota: QuotaTracker,
    provider: ProviderClient,
    offline: OfflineResponder,
    retry: RetryPolicy,
    key_builder: CacheKeyBuilder,
    config_source: Box<dyn ConfigSource>,
    persona_source: Box<dyn PersonaSource>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Produce a reply for `user_message` given the conversation so far.
    ///
    /// Returns `Err` only for [`Error::QuotaExceeded`]; every other failure
    /// mode resolves to a best-effort reply.
    pub async fn send_message(&self, user_message: &str, history: &[ChatTurn]) -> Result<AiReply> {
        let persona = self.resolve_persona().await;
        let config = self.config_source.provider_config().await;
        let key = self
            .key_builder
            .build(user_message, history, persona.as_ref(), &config.model);

        if let Some(reply) = self.cache.get(&key).await {
            return Ok(reply);
        }

        if !self.quota.allow() {
            return Err(Error::QuotaExceeded {
                minutes_left: self.quota.minutes_left(),
                max_requests: self.quota.max_requests(),
            });
        }

        if !config.has_credentials() {
            let reply = self.offline.generate(user_message, persona.as_ref());
            self.cache.put(&key, &reply).await;
            return Ok(reply);
        }

        let messages = ProviderClient::build_messages(persona.as_ref(), history, user_message);
        let result = retry_with_backoff(&self.retry, || {
            let quota = &self.quota;
            let provider = &self.provider;
            let config = &config;
            let messages = &messages[..];
            async move {
                // Charge on attempt, not on success: every attempt
                // (including retries) consumes one quota unit.
                quota.record();
                let snapshot = quota.snapshot();
                info!(
                    count = snapshot.count,
                    max = snapshot.max_requests,
                    "making AI request"
                );
                provider.chat_complete(config, messages).await
            }
        })
        .await;

        match result {
            Ok(content) => {
                let reply = AiReply::new(content, persona.as_ref().map(|p| p.id.clone()));
                self.cache.put(&key, &reply).await;
                Ok(reply)
            }
            Err(err) if err.is_quota_exceeded() => Err(err),
            Err(err) => {
                // Fallback replies are not cache-worthy: the next request
                // should get another chance at a real completion.
                warn!(error = %err, "provider call failed, answering offline");
                Ok(self.offline.generate(user_message, persona.as_ref()))
            }
        }
    }

    /// Persona lookup failure is never fatal; the call proceeds without one.
    async fn resolve_persona(&self) -> Option<Persona> {
        match self.persona_source.active_persona().await {
            Ok(persona) => persona.filter(|p| p.is_active),
            Err(err) => {
                warn!(error = %err, "active persona lookup failed, proceeding without");
                None
            }
        }
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn cache(&self) -> &ReplyCache {
        &self.cache
    }
}

/// Builder assembling the orchestrator from its collaborators. Every part
/// has a production default; tests swap in short windows, fast retries, and
/// fixed configuration.
pub struct OrchestratorBuilder {
    cache: Option<ReplyCache>,
    quota: Option<QuotaTracker>,
    provider: Option<ProviderClient>,
    retry: RetryPolicy,
    config_source: Option<Box<dyn ConfigSource>>,
    persona_source: Option<Box<dyn PersonaSource>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            cache: None,
            quota: None,
            provider: None,
            retry: RetryPolicy::new(),
            config_source: None,
            persona_source: None,
        }
    }

    pub fn cache(mut self, cache: ReplyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn quota(mut self, quota: QuotaTracker) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn provider(mut self, provider: ProviderClient) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.config_source = Some(Box::new(source));
        self
    }

    pub fn persona_source(mut self, source: impl PersonaSource + 'static) -> Self {
        self.persona_source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            cache: self
                .cache
                .unwrap_or_else(|| ReplyCache::new(Box::new(MemoryCache::default()))),
            quota: self.quota.unwrap_or_else(|| QuotaTracker::new(QuotaConfig::new())),
            provider: self.provider.unwrap_or_default(),
            offline: OfflineResponder::new(),
            retry: self.retry,
            key_builder: CacheKeyBuilder::new(),
            config_source: self.config_source.unwrap_or_else(|| Box::new(EnvConfigSource)),
            persona_source: self.persona_source.unwrap_or_else(|| Box::new(NoPersona)),
        }
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
