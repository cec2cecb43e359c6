//! CSRF token generation and validation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::Method;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::CsrfConfig;
use crate::error::SecurityError;

type HmacSha256 = Hmac<Sha256>;

/// Signed token payload. Serialized to JSON, base64url-encoded, and carried
/// inside the opaque token string itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenPayload {
    session_id: String,
    issued_at: u64,
    expires_at: u64,
    nonce: String,
}

/// Live-store entry for one issued token.
#[derive(Debug, Clone)]
struct TokenRecord {
    session_id: String,
    expires_at: u64,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Expiry as unix seconds.
    pub expires_at: u64,
}

/// Why a token failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    SignatureMismatch,
    SessionMismatch,
    Expired,
    Revoked,
    InvalidOrigin,
}

impl TokenFailure {
    pub fn into_error(self) -> SecurityError {
        match self {
            TokenFailure::SignatureMismatch => SecurityError::SignatureMismatch,
            TokenFailure::SessionMismatch => SecurityError::TokenSessionMismatch,
            TokenFailure::Expired => SecurityError::TokenExpired,
            TokenFailure::Revoked => SecurityError::TokenRevoked,
            TokenFailure::InvalidOrigin => SecurityError::OriginNotAllowed {
                origin: "<token origin>".to_string(),
            },
        }
    }
}

/// Outcome of validating a presented token.
#[derive(Debug, Clone)]
pub struct TokenValidation {
    pub is_valid: bool,
    pub errors: Vec<TokenFailure>,
    pub warnings: Vec<String>,
}

impl TokenValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn failed(failure: TokenFailure) -> Self {
        Self {
            is_valid: false,
            errors: vec![failure],
            warnings: Vec::new(),
        }
    }
}

/// Request metadata consulted during validation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub origin: Option<String>,
    pub referer: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            origin: None,
            referer: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// Methods that never mutate state and therefore bypass CSRF validation.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Manages issuance, validation and revocation of per-session CSRF tokens.
///
/// Constructed once at startup and shared by reference; no global state.
pub struct TokenManager {
    secret: Vec<u8>,
    lifetime: Duration,
    trusted_origins: Vec<String>,
    store: DashMap<String, TokenRecord>,
}

impl TokenManager {
    pub fn new(config: &CsrfConfig) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            lifetime: Duration::from_secs(config.token_lifetime_secs),
            // Entries may be bare hosts or full URLs; store hosts only so
            // both forms match presented origins.
            trusted_origins: config
                .trusted_origins
                .iter()
                .map(|o| extract_host(o))
                .collect(),
            store: DashMap::new(),
        }
    }

    /// Issue a new token bound to `session_id`.
    ///
    /// Also prunes expired entries from the live store, so the store never
    /// grows past the set of tokens issued within one lifetime.
    pub fn issue(&self, session_id: &str) -> IssuedToken {
        self.prune_expired();

        let now = unix_now();
        let expires_at = now + self.lifetime.as_secs();

        let payload = TokenPayload {
            session_id: session_id.to_string(),
            issued_at: now,
            expires_at,
            nonce: Uuid::new_v4().simple().to_string(),
        };
        let encoded = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&payload).expect("token payload serializes"),
        );
        let signature = hex::encode(self.mac(&encoded));
        let token = format!("{encoded}.{signature}");

        self.store.insert(
            token.clone(),
            TokenRecord {
                session_id: session_id.to_string(),
                expires_at,
            },
        );

        tracing::debug!(session = session_id, expires_at, "CSRF token issued");
        IssuedToken { token, expires_at }
    }

    /// Validate a presented token for `session_id` under `ctx`.
    ///
    /// Check order is fixed: signature, session binding, expiry, revocation,
    /// then origin. A bad signature short-circuits so nothing about the
    /// stored token is revealed. The referer header only ever produces a
    /// warning; it is attacker-influenceable.
    pub fn validate(&self, token: &str, session_id: &str, ctx: &RequestContext) -> TokenValidation {
        if is_safe_method(&ctx.method) {
            return TokenValidation::valid();
        }

        let Some(payload) = self.verify_signature(token) else {
            return TokenValidation::failed(TokenFailure::SignatureMismatch);
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if payload.session_id != session_id {
            errors.push(TokenFailure::SessionMismatch);
        }
        if unix_now() >= payload.expires_at {
            errors.push(TokenFailure::Expired);
        }
        if !self.store.contains_key(token) {
            errors.push(TokenFailure::Revoked);
        }

        if let Some(origin) = &ctx.origin {
            if !self.origin_trusted(origin) {
                errors.push(TokenFailure::InvalidOrigin);
            }
        }
        if let Some(referer) = &ctx.referer {
            if !self.origin_trusted(referer) {
                warnings.push(format!("referer outside trusted origins: {referer}"));
            }
        }

        TokenValidation {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Remove a single token (logout).
    pub fn invalidate(&self, token: &str) {
        self.store.remove(token);
    }

    /// Remove every token bound to a session (session teardown).
    pub fn invalidate_session(&self, session_id: &str) {
        self.store.retain(|_, record| record.session_id != session_id);
    }

    /// Number of live (unrevoked, possibly expired) tokens.
    pub fn live_tokens(&self) -> usize {
        self.store.len()
    }

    /// Drop store entries past their expiry.
    pub fn prune_expired(&self) {
        let now = unix_now();
        self.store.retain(|_, record| record.expires_at > now);
    }

    fn mac(&self, data: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Decode and verify the MAC. Returns the payload only when the
    /// signature matches in constant time.
    fn verify_signature(&self, token: &str) -> Option<TokenPayload> {
        let (encoded, signature_hex) = token.split_once('.')?;
        let presented = hex::decode(signature_hex).ok()?;
        let expected = self.mac(encoded);
        if !bool::from(expected.ct_eq(&presented)) {
            return None;
        }
        let payload_bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        serde_json::from_slice(&payload_bytes).ok()
    }

    /// Exact match against the allow-list, or a registrable subdomain of an
    /// allow-listed host.
    fn origin_trusted(&self, origin: &str) -> bool {
        let host = extract_host(origin);
        self.trusted_origins.iter().any(|trusted| {
            host == *trusted || host.ends_with(&format!(".{trusted}"))
        })
    }
}

/// Pull the lowercase host out of an origin or referer value, tolerating
/// bare hostnames as well as full URLs.
fn extract_host(value: &str) -> String {
    if let Ok(url) = url::Url::parse(value) {
        if let Some(host) = url.host_str() {
            return host.to_lowercase();
        }
    }
    value
        .trim_end_matches('/')
        .rsplit("://")
        .next()
        .unwrap_or(value)
        .split(&[':', '/'][..])
        .next()
        .unwrap_or(value)
        .to_lowercase()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
