//! # Response Caching Module
//!
//! Content-addressed caching of AI replies with TTL expiry. The cache sits in
//! front of both the quota tracker and the provider call: a hit terminates
//! the request without consuming any quota.
//!
//! Caching is best-effort by contract. A backend that cannot be read or
//! written must never abort a request; [`ReplyCache`] logs the failure and
//! the orchestrator proceeds as on a miss.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheKeyBuilder`] | Deterministic key derivation from request content |
//! | [`CacheKey`] | Opaque content-addressed digest |
//! | [`ReplyCache`] | Typed get/put of [`AiReply`](crate::AiReply) with TTL and statistics |
//! | [`CacheBackend`] | Trait for pluggable storage backends |
//! | [`MemoryCache`] | In-process store with passive TTL expiry |
//! | [`NullCache`] | No-op backend for disabling caching |

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyBuilder};
pub use manager::{CacheStats, ReplyCache};
