//! Metric recording for the security subsystem.
//!
//! # Metrics
//! - `shield_requests_total` (counter): gateway requests by outcome
//! - `shield_rate_limited_total` (counter): denials by identifier class
//! - `shield_violations_total` (counter): violation events by kind, severity
//! - `shield_threats_total` (counter): sanitizer findings by rule

use metrics::counter;

/// Record a gateway request outcome ("allowed", "blocked", "failed").
pub fn record_request(outcome: &str) {
    counter!("shield_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a rate-limit denial.
pub fn record_rate_limited(class: &str) {
    counter!("shield_rate_limited_total", "class" => class.to_string()).increment(1);
}

/// Record a security violation event.
pub fn record_violation(kind: &str, severity: &str) {
    counter!(
        "shield_violations_total",
        "kind" => kind.to_string(),
        "severity" => severity.to_string()
    )
    .increment(1);
}

/// Record a sanitizer rule hit.
pub fn record_threat(rule_id: &str) {
    counter!("shield_threats_total", "rule" => rule_id.to_string()).increment(1);
}
