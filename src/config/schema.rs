//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the security
//! subsystem. All types derive Serde traits for deserialization from config
//! files; defaults are chosen so an empty file yields a usable development
//! setup.

use serde::{Deserialize, Serialize};

/// Deployment environment. Drives CSP overlays and validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Overall strictness knob consumed by callers deciding reject-vs-correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

/// Feature flags contributing CSP overlays.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub payment: bool,
    pub authentication: bool,
    pub analytics: bool,
    pub pwa: bool,
    pub mobile: bool,
    pub high_security: bool,
}

/// Root configuration for the request-security subsystem.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Deployment environment.
    pub environment: Environment,

    /// Overall strictness level.
    pub security_level: SecurityLevel,

    /// Feature flags (each contributes CSP sources).
    pub features: FeatureFlags,

    /// CSRF token settings.
    pub csrf: CsrfConfig,

    /// Input sanitizer settings.
    pub sanitizer: SanitizerConfig,

    /// Per-route-class rate limits.
    pub rate_limits: RateLimits,

    /// Gateway pipeline settings.
    pub gateway: GatewayConfig,

    /// CSP composition and reporting settings.
    pub policy: PolicyConfig,
}

/// CSRF token lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// MAC secret. Must be at least 32 bytes outside development.
    pub secret: String,

    /// Token lifetime in seconds.
    pub token_lifetime_secs: u64,

    /// Header carrying the token on non-safe requests.
    pub header_name: String,

    /// Cookie name for optional token persistence.
    pub cookie_name: String,

    /// Origins allowed to present tokens (exact or registrable subdomain).
    pub trusted_origins: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            secret: "development-only-csrf-secret-change-me!!".to_string(),
            token_lifetime_secs: 3600,
            header_name: "X-CSRF-Token".to_string(),
            cookie_name: "csrf_token".to_string(),
            trusted_origins: vec!["localhost".to_string()],
        }
    }
}

/// Input sanitizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Inputs longer than this are truncated before scanning.
    pub max_input_length: usize,

    /// Capacity of the violation ring buffer.
    pub violation_log_capacity: usize,

    /// Transfer amounts above this escalate banking risk to critical.
    pub large_transaction_threshold: u64,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_input_length: 10_000,
            violation_log_capacity: 256,
            large_transaction_threshold: 1_000_000,
        }
    }
}

/// Sliding-window rate-limit parameters for one route class.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Maximum requests admitted inside the window.
    pub max_requests: usize,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Block duration applied once the window fills, in milliseconds.
    pub block_duration_ms: u64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_ms: 60_000,
            block_duration_ms: 300_000,
        }
    }
}

/// Per-route-class rate limits.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimits {
    pub general: RateLimitPolicy,
    pub auth: RateLimitPolicy,
    pub transfer: RateLimitPolicy,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            general: RateLimitPolicy::default(),
            auth: RateLimitPolicy {
                max_requests: 5,
                window_ms: 60_000,
                block_duration_ms: 900_000,
            },
            transfer: RateLimitPolicy {
                max_requests: 10,
                window_ms: 60_000,
                block_duration_ms: 600_000,
            },
        }
    }
}

/// Gateway pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Origins requests may target.
    pub allowed_origins: Vec<String>,

    /// Require a CSRF token on all non-safe-method requests.
    pub require_csrf: bool,

    /// Response bodies larger than this are rejected.
    pub max_response_bytes: usize,

    /// Transport timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost".to_string()],
            require_csrf: true,
            max_response_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// CSP reporting configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Legacy report-uri endpoint, appended to the serialized policy.
    pub report_uri: Option<String>,

    /// Reporting API group name, appended as report-to.
    pub report_to: Option<String>,

    /// Emit Content-Security-Policy-Report-Only instead of enforcing.
    pub report_only: bool,
}
