//! Cache backend implementations.

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct StoredEntry {
    data: Vec<u8>,
    created_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// Pluggable storage for serialized replies.
///
/// Implementations are treated as possibly-remote shared stores: writes to
/// the same key are idempotent (same key derives from the same content), so
/// last-writer-wins needs no coordination here.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// In-process store with passive TTL expiry: entries are dropped when a read
/// finds them expired. A hard entry cap guards memory; when full, expired
/// entries are purged and, failing that, the write is refused rather than
/// evicting live entries (TTL is the only eviction contract).
pub struct MemoryCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| crate::Error::cache("memory cache lock poisoned"))?;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| crate::Error::cache("memory cache lock poisoned"))?;
        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            entries.retain(|_, e| !e.is_expired());
            if entries.len() >= self.max_entries {
                return Err(crate::Error::cache("memory cache full"));
            }
        }
        entries.insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| crate::Error::cache("memory cache lock poisoned"))?;
        Ok(entries.remove(key).is_some())
    }

    async fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| crate::Error::cache("memory cache lock poisoned"))?;
        Ok(entries.values().filter(|e| !e.is_expired()).count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op backend: every read misses, every write succeeds silently. Stands in
/// when caching is disabled or the real store is unavailable.
#[derive(Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &str, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &str) -> Result<bool> {
        Ok(false)
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = MemoryCache::new(8);
        cache
            .set("k", b"value", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn expired_entries_miss_and_are_dropped() {
        let cache = MemoryCache::new(8);
        cache.set("k", b"v", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn full_cache_refuses_new_live_entries() {
        let cache = MemoryCache::new(1);
        cache.set("a", b"1", Duration::from_secs(60)).await.unwrap();
        assert!(cache.set("b", b"2", Duration::from_secs(60)).await.is_err());
        // Overwriting an existing key is always allowed.
        assert!(cache.set("a", b"3", Duration::from_secs(60)).await.is_ok());
    }

    #[tokio::test]
    async fn null_cache_never_stores() {
        let cache = NullCache::new();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.len().await.unwrap(), 0);
    }
}
