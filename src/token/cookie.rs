//! Optional cookie persistence for CSRF tokens.
//!
//! Produces a `Set-Cookie` value the hosting environment can attach so the
//! token survives page reloads. Attributes are fixed: `SameSite=Strict`,
//! `Path=/`, `HttpOnly`, `Secure`.

use chrono::{TimeZone, Utc};

/// Serialize a token into a `Set-Cookie` header value.
///
/// `expires_at` is unix seconds; `Max-Age` is derived from `now` so the two
/// attributes always agree.
pub fn token_cookie(name: &str, token: &str, expires_at: u64, now: u64) -> String {
    let max_age = expires_at.saturating_sub(now);
    let expires = Utc
        .timestamp_opt(expires_at as i64, 0)
        .single()
        .map(|t| t.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_default();

    format!(
        "{name}={token}; Expires={expires}; Max-Age={max_age}; SameSite=Strict; Path=/; HttpOnly; Secure"
    )
}
