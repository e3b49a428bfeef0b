//! # ai-orchestrator
//!
//! AI request orchestration layer for the chat dashboard: the code path that
//! turns a user's chat message plus conversation history into a reply from an
//! upstream OpenAI-compatible chat-completion provider.
//!
//! The orchestrator coordinates four concerns on every call:
//!
//! - **Response caching**: identical requests are deduplicated through a
//!   content-addressed cache with a fixed TTL, so repeated questions never
//!   consume provider quota.
//! - **Quota enforcement**: a fixed-window counter caps upstream calls per
//!   hour, conservatively below the provider's free-tier ceiling.
//! - **Retry with backoff**: transient provider failures are retried with
//!   exponential backoff plus jitter; authorization failures are not.
//! - **Offline fallback**: when no credential is configured, or the provider
//!   is ultimately unreachable, a persona-styled canned responder guarantees
//!   the user still receives a reply.
//!
//! Only one failure mode crosses the crate boundary as an error:
//! [`Error::QuotaExceeded`], which the host must show to the end user
//! verbatim. Every other failure is absorbed into a best-effort reply.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ai_orchestrator::{ChatTurn, EnvConfigSource, NoPersona, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> ai_orchestrator::Result<()> {
//!     let orchestrator = Orchestrator::builder()
//!         .config_source(EnvConfigSource)
//!         .persona_source(NoPersona)
//!         .build();
//!
//!     let history: Vec<ChatTurn> = Vec::new();
//!     let reply = orchestrator.send_message("Hola", &history).await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`orchestrator`] | Composition root: cache → quota → provider → fallback |
//! | [`cache`] | Content-addressed response cache with TTL expiry |
//! | [`resilience`] | Fixed-window quota tracking |
//! | [`client`] | Provider client adapter and retry executor |
//! | [`offline`] | Deterministic offline reply generator |
//! | [`types`] | Core records (chat turns, personas, replies) |
//! | [`config`] | Provider configuration read at call time |

pub mod cache;
pub mod client;
pub mod config;
pub mod offline;
pub mod orchestrator;
pub mod resilience;
pub mod types;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;

// Re-export main types for convenience
pub use cache::{CacheKey, CacheKeyBuilder, MemoryCache, NullCache, ReplyCache};
pub use client::{ProviderClient, RetryPolicy};
pub use config::{ConfigSource, EnvConfigSource, ProviderConfig, StaticConfigSource};
pub use offline::OfflineResponder;
pub use orchestrator::{
    NoPersona, Orchestrator, OrchestratorBuilder, PersonaSource, StaticPersona,
};
pub use resilience::{QuotaConfig, QuotaTracker};
pub use types::{AiReply, ChatRole, ChatTurn, Persona};
