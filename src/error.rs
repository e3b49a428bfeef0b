use thiserror::Error;

/// Unified error type for the orchestration layer.
///
/// Only [`Error::QuotaExceeded`] is intended to cross the crate boundary to
/// the end user; the orchestrator absorbs every other variant into an offline
/// fallback reply. The variants still carry enough structure for the retry
/// executor to classify them.
#[derive(Debug, Error)]
pub enum Error {
    /// The fixed-window request quota is exhausted. Shown to the user
    /// verbatim so the cost-control signal is never hidden.
    #[error("Rate limit exceeded. Try again in {minutes_left} minutes. (Free tier: {max_requests} requests/hour)")]
    QuotaExceeded {
        minutes_left: u64,
        max_requests: u32,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("Provider error: HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// All retry attempts were consumed without a success.
    #[error("Max retries exceeded after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Cache backend failure. Never fatal to a request; the manager logs
    /// these and the orchestrator proceeds as on a miss.
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
        }
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Error::Cache {
            message: msg.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            Error::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Unauthorized/forbidden responses mean a server-side credential
    /// problem; retrying cannot fix them.
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Whether the retry executor may attempt this call again.
    ///
    /// Conservative classification: anything that is not an auth failure or
    /// a quota stop is considered transient (timeouts, 5xx, malformed
    /// responses, connection resets).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::QuotaExceeded { .. } => false,
            Error::Configuration { .. } => false,
            _ => !self.is_auth(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: u16) -> Error {
        Error::Provider {
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn auth_statuses_are_not_retryable() {
        assert!(provider(401).is_auth());
        assert!(provider(403).is_auth());
        assert!(!provider(401).is_retryable());
        assert!(!provider(403).is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(provider(500).is_retryable());
        assert!(provider(429).is_retryable());
        assert!(!provider(500).is_auth());
    }

    #[test]
    fn quota_exceeded_is_terminal() {
        let err = Error::QuotaExceeded {
            minutes_left: 12,
            max_requests: 8,
        };
        assert!(err.is_quota_exceeded());
        assert!(!err.is_retryable());
        let msg = err.to_string();
        assert!(msg.contains("12 minutes"));
        assert!(msg.contains("8 requests/hour"));
    }

    #[test]
    fn retries_exhausted_preserves_inner_status() {
        let err = Error::RetriesExhausted {
            attempts: 4,
            source: Box::new(provider(503)),
        };
        assert_eq!(err.status(), Some(503));
    }
}
