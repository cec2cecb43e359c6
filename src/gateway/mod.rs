//! The secure gateway: fixed security pipeline around every network call.
//!
//! # Data Flow
//! ```text
//! caller → rate limit → origin allow-list → CSRF attach
//!        → outbound sanitize → transport
//!        → response checks → inbound sanitize → caller
//! ```
//!
//! # Design Decisions
//! - The order is a hard guarantee: throttled or rejected calls never pay
//!   sanitization or network cost and never advance token state
//! - A timed-out or aborted call keeps its rate-limiter increment, so retry
//!   storms cannot bypass the limiter
//! - Inbound findings are auto-corrected; outbound high-risk payloads are
//!   rejected before anything is sent

pub mod headers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use dashmap::DashMap;
use serde_json::Value;
use url::Url;

use crate::config::{RateLimitPolicy, ShieldConfig};
use crate::error::SecurityError;
use crate::events::{ViolationKind, ViolationLog};
use crate::observability::metrics;
use crate::ratelimit::RateLimiter;
use crate::risk::RiskLevel;
use crate::sanitize::{SanitizeOptions, ThreatSanitizer};
use crate::token::manager::{is_safe_method, RequestContext, TokenManager};

/// Response headers whose absence is logged (never fatal).
const EXPECTED_SECURITY_HEADERS: [&str; 3] = [
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
];

/// Rate-limit class of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteClass {
    #[default]
    General,
    Auth,
    Transfer,
}

impl RouteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::General => "general",
            RouteClass::Auth => "auth",
            RouteClass::Transfer => "transfer",
        }
    }
}

/// One outbound call under the gateway's protection.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub session_id: String,
    pub body: Option<Value>,
    pub route_class: RouteClass,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            session_id: session_id.into(),
            body: None,
            route_class: RouteClass::General,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_route_class(mut self, class: RouteClass) -> Self {
        self.route_class = class;
        self
    }
}

/// Orchestrates limiter, token manager and sanitizer around every call.
///
/// Constructed once per session/process and shared by reference; every
/// collaborator is injected, so tests build isolated instances freely.
pub struct SecureGateway {
    config: ShieldConfig,
    limiter: Arc<RateLimiter>,
    tokens: Arc<TokenManager>,
    sanitizer: Arc<ThreatSanitizer>,
    violations: Arc<ViolationLog>,
    sessions: DashMap<String, String>,
    client: reqwest::Client,
}

impl SecureGateway {
    /// Build a gateway and all of its collaborators from configuration.
    pub fn from_config(config: ShieldConfig) -> Result<Self, SecurityError> {
        let violations = Arc::new(ViolationLog::new(config.sanitizer.violation_log_capacity));
        let limiter = Arc::new(RateLimiter::new(violations.clone()));
        let tokens = Arc::new(TokenManager::new(&config.csrf));
        let sanitizer = Arc::new(ThreatSanitizer::new(&config.sanitizer));
        Self::new(config, limiter, tokens, sanitizer, violations)
    }

    /// Build a gateway around injected collaborators.
    pub fn new(
        config: ShieldConfig,
        limiter: Arc<RateLimiter>,
        tokens: Arc<TokenManager>,
        sanitizer: Arc<ThreatSanitizer>,
        violations: Arc<ViolationLog>,
    ) -> Result<Self, SecurityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway.request_timeout_secs))
            .build()?;
        Ok(Self {
            config,
            limiter,
            tokens,
            sanitizer,
            violations,
            sessions: DashMap::new(),
            client,
        })
    }

    /// Issue and remember a CSRF token for a session.
    pub fn establish_session(&self, session_id: &str) -> String {
        let issued = self.tokens.issue(session_id);
        self.sessions
            .insert(session_id.to_string(), issued.token.clone());
        issued.token
    }

    /// Adopt a token restored from the persistence medium (cookie or
    /// session store). The token is validated lazily on first use.
    pub fn resume_session(&self, session_id: &str, token: String) {
        self.sessions.insert(session_id.to_string(), token);
    }

    /// Invalidate the session's tokens (logout).
    pub fn end_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
        self.tokens.invalidate_session(session_id);
    }

    /// The current token for a session, if one was established.
    pub fn session_token(&self, session_id: &str) -> Option<String> {
        self.sessions.get(session_id).map(|t| t.value().clone())
    }

    /// Shared collaborators, exposed for diagnostics and tests.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn violations(&self) -> &ViolationLog {
        &self.violations
    }

    /// Run one call through the full pipeline.
    pub async fn send(&self, request: OutboundRequest) -> Result<Value, SecurityError> {
        // 1. Rate limit. The attempt counts even if a later step rejects.
        let identifier = format!("{}:{}", request.session_id, request.route_class.as_str());
        let policy = self.rate_policy(request.route_class);
        if !self.limiter.is_allowed(&identifier, &policy) {
            metrics::record_request("blocked");
            return Err(SecurityError::RateLimitExceeded { identifier });
        }

        // 2. Origin allow-list
        let origin = request_origin(&request.url)?;
        if !self.origin_allowed(&origin) {
            metrics::record_request("blocked");
            self.violations.record(
                ViolationKind::General,
                RiskLevel::High,
                &format!("call to disallowed origin {origin}"),
                &request.session_id,
            );
            return Err(SecurityError::OriginNotAllowed { origin });
        }

        // 3. CSRF attach for non-safe methods
        let csrf_token = if is_safe_method(&request.method) {
            None
        } else {
            match self.session_token(&request.session_id) {
                Some(token) => {
                    let ctx =
                        RequestContext::new(request.method.clone()).with_origin(origin.clone());
                    let validation = self.tokens.validate(&token, &request.session_id, &ctx);
                    if let Some(failure) = validation.errors.first() {
                        metrics::record_request("blocked");
                        self.violations.record(
                            ViolationKind::Csrf,
                            RiskLevel::High,
                            "stored CSRF token failed validation",
                            &request.session_id,
                        );
                        return Err(failure.into_error());
                    }
                    Some(token)
                }
                None if self.config.gateway.require_csrf => {
                    metrics::record_request("blocked");
                    self.violations.record(
                        ViolationKind::Csrf,
                        RiskLevel::High,
                        "non-safe request without CSRF token",
                        &request.session_id,
                    );
                    return Err(SecurityError::CsrfTokenMissing);
                }
                None => None,
            }
        };

        // 4. Outbound sanitization
        let body = match request.body {
            Some(body) => {
                let options = SanitizeOptions::default();
                let (sanitized, risk, had_findings) = self.sanitize_tree(body, &options);
                if risk >= RiskLevel::High {
                    metrics::record_request("blocked");
                    self.violations.record(
                        ViolationKind::Xss,
                        risk,
                        "outbound payload rejected by sanitizer",
                        &request.session_id,
                    );
                    return Err(SecurityError::ThreatDetected { risk });
                }
                if had_findings {
                    tracing::debug!(session = %request.session_id, "outbound payload auto-corrected");
                }
                Some(sanitized)
            }
            None => None,
        };

        // 5. Transport
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(token) = csrf_token {
            builder = builder.header(self.config.csrf.header_name.as_str(), token);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        // 6. Response validation
        let status = response.status();
        if !status.is_success() {
            metrics::record_request("failed");
            return Err(SecurityError::Http {
                status: status.as_u16(),
            });
        }
        for header in EXPECTED_SECURITY_HEADERS {
            if !response.headers().contains_key(header) {
                tracing::warn!(header, url = %request.url, "response missing security header");
            }
        }
        let bytes = response.bytes().await?;
        let max = self.config.gateway.max_response_bytes;
        if bytes.len() > max {
            metrics::record_request("failed");
            return Err(SecurityError::ResponseTooLarge {
                actual: bytes.len(),
                max,
            });
        }

        // 7. Inbound sanitization: auto-correct, never reject
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        let (sanitized, risk, had_findings) =
            self.sanitize_tree(value, &SanitizeOptions::default());
        if had_findings {
            self.violations.record(
                ViolationKind::Xss,
                risk,
                "inbound response body auto-corrected",
                &request.session_id,
            );
        }

        metrics::record_request("allowed");
        Ok(sanitized)
    }

    fn rate_policy(&self, class: RouteClass) -> RateLimitPolicy {
        match class {
            RouteClass::General => self.config.rate_limits.general,
            RouteClass::Auth => self.config.rate_limits.auth,
            RouteClass::Transfer => self.config.rate_limits.transfer,
        }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.config
            .gateway
            .allowed_origins
            .iter()
            .any(|allowed| match Url::parse(allowed) {
                Ok(url) => origin_of(&url) == origin,
                Err(_) => false,
            })
    }

    /// Walk a JSON tree sanitizing every string leaf; other leaves pass
    /// through unchanged.
    fn sanitize_tree(
        &self,
        value: Value,
        options: &SanitizeOptions,
    ) -> (Value, RiskLevel, bool) {
        let mut risk = RiskLevel::Low;
        let mut had_findings = false;
        let sanitized = self.sanitize_node(value, options, &mut risk, &mut had_findings);
        (sanitized, risk, had_findings)
    }

    fn sanitize_node(
        &self,
        value: Value,
        options: &SanitizeOptions,
        risk: &mut RiskLevel,
        had_findings: &mut bool,
    ) -> Value {
        match value {
            Value::String(s) => {
                let result = self.sanitizer.validate(&s, options);
                *risk = (*risk).max(result.risk_level);
                *had_findings |= !result.findings.is_empty();
                Value::String(result.sanitized_value)
            }
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.sanitize_node(item, options, risk, had_findings))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, self.sanitize_node(item, options, risk, had_findings)))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Normalized `scheme://host[:port]` of a call target.
fn request_origin(raw: &str) -> Result<String, SecurityError> {
    let url = Url::parse(raw)
        .map_err(|_| SecurityError::Validation(format!("malformed request URL: {raw}")))?;
    Ok(origin_of(&url))
}

fn origin_of(url: &Url) -> String {
    let mut origin = format!(
        "{}://{}",
        url.scheme(),
        url.host_str().unwrap_or_default()
    );
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }
    origin
}
