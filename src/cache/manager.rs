//! Typed reply cache over a pluggable backend.

use super::backend::CacheBackend;
use super::key::CacheKey;
use crate::types::AiReply;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Namespace prefix so AI replies never collide with other tenants of a
/// shared store.
const KEY_PREFIX: &str = "ai_cache";

/// Replies stay cached for one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache effectiveness counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

/// Best-effort accelerator in front of the provider call.
///
/// Every failure mode here (backend unreachable, undecodable entry) is logged
/// and reported as a miss or a skipped write; the orchestration path never
/// fails because of the cache.
pub struct ReplyCache {
    backend: Box<dyn CacheBackend>,
    ttl: Duration,
    stats: AtomicStats,
}

impl ReplyCache {
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self::with_ttl(backend, DEFAULT_TTL)
    }

    pub fn with_ttl(backend: Box<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            stats: AtomicStats::default(),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<AiReply> {
        let namespaced = self.namespaced(key);
        match self.backend.get(&namespaced).await {
            Ok(Some(data)) => match serde_json::from_slice::<AiReply>(&data) {
                Ok(reply) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "cache hit for AI request");
                    Some(reply)
                }
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, error = %e, "undecodable cache entry, treating as miss");
                    None
                }
            },
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "cache read error");
                None
            }
        }
    }

    pub async fn put(&self, key: &CacheKey, reply: &AiReply) {
        let data = match serde_json::to_vec(reply) {
            Ok(data) => data,
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "cache serialization error, skipping write");
                return;
            }
        };
        let namespaced = self.namespaced(key);
        match self.backend.set(&namespaced, &data, self.ttl).await {
            Ok(()) => {
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, ttl_secs = self.ttl.as_secs(), "response cached");
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "cache write error");
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn namespaced(&self, key: &CacheKey) -> String {
        format!("{}:{}", KEY_PREFIX, key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKeyBuilder, MemoryCache, NullCache};

    fn key(msg: &str) -> CacheKey {
        CacheKeyBuilder::new().build(msg, &[], None, "m")
    }

    #[tokio::test]
    async fn put_then_get_returns_the_reply() {
        let cache = ReplyCache::new(Box::new(MemoryCache::new(8)));
        let reply = AiReply::new("hola", Some("p1".into()));
        let k = key("hola");
        cache.put(&k, &reply).await;
        assert_eq!(cache.get(&k).await, Some(reply));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn expiry_turns_hits_into_misses() {
        let cache = ReplyCache::with_ttl(
            Box::new(MemoryCache::new(8)),
            Duration::from_millis(10),
        );
        let k = key("hola");
        cache.put(&k, &AiReply::new("hola", None)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get(&k).await, None);
    }

    #[tokio::test]
    async fn backend_failures_are_swallowed() {
        // A full one-slot cache refuses the second write; put() must not panic
        // or surface the error, and the entry simply stays absent.
        let cache = ReplyCache::new(Box::new(MemoryCache::new(1)));
        cache.put(&key("a"), &AiReply::new("a", None)).await;
        cache.put(&key("b"), &AiReply::new("b", None)).await;
        assert_eq!(cache.get(&key("b")).await, None);
        assert!(cache.stats().errors >= 1);
    }

    #[tokio::test]
    async fn null_backend_always_misses() {
        let cache = ReplyCache::new(Box::new(NullCache::new()));
        let k = key("hola");
        cache.put(&k, &AiReply::new("hola", None)).await;
        assert_eq!(cache.get(&k).await, None);
        assert_eq!(cache.stats().misses, 1);
    }
}
