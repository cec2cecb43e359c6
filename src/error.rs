//! Crate-level error taxonomy.
//!
//! # Design Decisions
//! - CSRF, rate-limit and origin failures abort the pipeline and surface as
//!   errors; sanitizer findings are returned inside `ValidationResult` so the
//!   caller decides policy
//! - No internal diagnostic detail leaks through `user_message`

use crate::risk::RiskLevel;
use thiserror::Error;

/// Errors raised by the request-security subsystem.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("input validation failed: {0}")]
    Validation(String),

    #[error("security threat detected (risk {risk})")]
    ThreatDetected { risk: RiskLevel },

    #[error("rate limit exceeded for {identifier}")]
    RateLimitExceeded { identifier: String },

    #[error("origin not allowed: {origin}")]
    OriginNotAllowed { origin: String },

    #[error("CSRF token missing")]
    CsrfTokenMissing,

    #[error("CSRF token expired")]
    TokenExpired,

    #[error("CSRF token revoked or unknown")]
    TokenRevoked,

    #[error("CSRF token signature mismatch")]
    SignatureMismatch,

    #[error("CSRF token bound to a different session")]
    TokenSessionMismatch,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("response too large: {actual} bytes exceeds cap of {max}")]
    ResponseTooLarge { actual: usize, max: usize },

    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("invalid JSON in response body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SecurityError {
    /// Generic message safe to show an end user. Never exposes internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            SecurityError::RateLimitExceeded { .. } => "Too many requests, please retry later",
            _ => "Request blocked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_generic() {
        let err = SecurityError::SignatureMismatch;
        assert_eq!(err.user_message(), "Request blocked");
        assert!(!err.user_message().contains("signature"));
    }
}
