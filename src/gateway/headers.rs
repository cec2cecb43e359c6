//! Companion hardening response headers.
//!
//! # Responsibilities
//! - Produce the CSP header (enforcing or report-only) from the composer
//! - Produce the fixed hardening set: HSTS, nosniff, frame options,
//!   referrer and permissions policies
//!
//! # Design Decisions
//! - Returned as name/value pairs; the hosting environment owns attachment

use crate::policy::PolicyComposer;

const HSTS: &str = "max-age=31536000; includeSubDomains";
const PERMISSIONS: &str = "geolocation=(), camera=(), microphone=(), payment=(self)";

/// The full hardening header set for a page response.
pub fn hardening_headers(composer: &PolicyComposer) -> Vec<(&'static str, String)> {
    vec![
        (composer.header_name(), composer.header_value()),
        ("Strict-Transport-Security", HSTS.to_string()),
        ("X-Content-Type-Options", "nosniff".to_string()),
        ("X-Frame-Options", "DENY".to_string()),
        (
            "Referrer-Policy",
            "strict-origin-when-cross-origin".to_string(),
        ),
        ("Permissions-Policy", PERMISSIONS.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShieldConfig;

    #[test]
    fn test_full_header_set() {
        let composer = PolicyComposer::new(&ShieldConfig::default());
        let headers = hardening_headers(&composer);
        assert_eq!(headers.len(), 6);
        assert_eq!(headers[0].0, "Content-Security-Policy");
        assert!(headers[0].1.starts_with("default-src"));
        assert!(headers
            .iter()
            .any(|(name, value)| *name == "X-Content-Type-Options" && value == "nosniff"));
    }

    #[test]
    fn test_report_only_mode_switches_header_name() {
        let mut config = ShieldConfig::default();
        config.policy.report_only = true;
        let composer = PolicyComposer::new(&config);
        let headers = hardening_headers(&composer);
        assert_eq!(headers[0].0, "Content-Security-Policy-Report-Only");
    }
}
