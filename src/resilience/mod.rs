//! # Resilience Module
//!
//! Cost-control primitives that gate calls to the upstream provider. The one
//! implemented here is a fixed-window quota: a time-aligned bucket that
//! counts upstream attempts and resets when the bucket elapses.
//!
//! The quota is deliberately process-local. Distributing it across processes
//! is a non-goal; the capacity is chosen conservatively below the provider's
//! published ceiling precisely so a single process can enforce it alone.

mod quota;

pub use quota::{Clock, QuotaConfig, QuotaSnapshot, QuotaTracker, SystemClock};
