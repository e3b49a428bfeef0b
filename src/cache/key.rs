//! Cache key generation.
//!
//! Keys are derived from the semantic content of a request: the new user
//! message, the trailing window of conversation history, the active persona,
//! and the model. Fields are combined through a `BTreeMap` so the encoding is
//! canonical regardless of construction order, then digested with SHA-256.
//! Content addressing only; nothing here is security-sensitive.

use crate::types::{ChatTurn, Persona};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// How many trailing history turns contribute to the key. Older turns are
/// ignored so that ancient context neither grows the key cost nor prevents
/// cache hits.
const HISTORY_WINDOW: usize = 5;

/// Persona field value when no persona is active.
const DEFAULT_PERSONA: &str = "default";

/// Opaque content-addressed cache key (hex SHA-256 digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role + content projection of a history turn. Timestamps and IDs are
/// deliberately excluded: two conversations with the same visible text must
/// produce the same key.
#[derive(Serialize)]
struct TurnDigest<'a> {
    role: &'a str,
    content: &'a str,
}

/// Derives a [`CacheKey`] from a request's semantic content.
///
/// Pure and infallible: no I/O, no side effects, and serialization cannot
/// fail for these in-memory shapes.
#[derive(Debug, Default)]
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        user_message: &str,
        history: &[ChatTurn],
        persona: Option<&Persona>,
        model: &str,
    ) -> CacheKey {
        let tail = history.len().saturating_sub(HISTORY_WINDOW);
        let window: Vec<TurnDigest<'_>> = history[tail..]
            .iter()
            .map(|turn| TurnDigest {
                role: turn.role.as_provider_str(),
                content: &turn.content,
            })
            .collect();

        let mut parts: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
        parts.insert("message", serde_json::Value::String(user_message.into()));
        parts.insert(
            "history",
            serde_json::to_value(&window).unwrap_or_default(),
        );
        parts.insert(
            "persona",
            serde_json::Value::String(
                persona.map(|p| p.id.clone()).unwrap_or_else(|| DEFAULT_PERSONA.into()),
            ),
        );
        parts.insert("model", serde_json::Value::String(model.into()));

        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey(hash)
    }
}
