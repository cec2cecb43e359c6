//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check secret strength outside development
//! - Validate value ranges (windows > 0, caps > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ShieldConfig → Result<(), Vec<String>>
//! - Runs before the config is accepted into the system

use url::Url;

use crate::config::schema::{Environment, RateLimitPolicy, ShieldConfig};

const MIN_SECRET_BYTES: usize = 32;

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ShieldConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.environment != Environment::Development
        && config.csrf.secret.len() < MIN_SECRET_BYTES
    {
        errors.push(format!(
            "csrf.secret must be at least {MIN_SECRET_BYTES} bytes outside development"
        ));
    }

    if config.csrf.token_lifetime_secs == 0 {
        errors.push("csrf.token_lifetime_secs must be greater than zero".to_string());
    }

    for origin in &config.csrf.trusted_origins {
        if origin.trim().is_empty() || origin.contains(char::is_whitespace) {
            errors.push(format!("csrf.trusted_origins entry is malformed: {origin:?}"));
        }
    }

    check_rate_policy("rate_limits.general", &config.rate_limits.general, &mut errors);
    check_rate_policy("rate_limits.auth", &config.rate_limits.auth, &mut errors);
    check_rate_policy("rate_limits.transfer", &config.rate_limits.transfer, &mut errors);

    if config.gateway.max_response_bytes == 0 {
        errors.push("gateway.max_response_bytes must be greater than zero".to_string());
    }

    for origin in &config.gateway.allowed_origins {
        if Url::parse(origin).is_err() {
            errors.push(format!("gateway.allowed_origins entry is not a URL: {origin}"));
        }
    }

    if config.sanitizer.max_input_length == 0 {
        errors.push("sanitizer.max_input_length must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rate_policy(name: &str, policy: &RateLimitPolicy, errors: &mut Vec<String>) {
    if policy.max_requests == 0 {
        errors.push(format!("{name}.max_requests must be greater than zero"));
    }
    if policy.window_ms == 0 {
        errors.push(format!("{name}.window_ms must be greater than zero"));
    }
}
