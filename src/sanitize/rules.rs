//! Versioned, table-driven threat rule catalogue.
//!
//! # Responsibilities
//! - Define the hard threat patterns (blocking findings)
//! - Define the soft banking patterns (non-blocking warnings)
//! - Compile everything once at construction
//!
//! # Design Decisions
//! - Rules are data: {id, category, severity, pattern}. Adding a rule never
//!   touches scanning control flow
//! - Patterns avoid lookaround so they stay inside the `regex` crate's
//!   linear-time guarantees

use regex::Regex;

use crate::risk::RiskLevel;

/// Bumped whenever a rule is added, removed or reworded.
pub const RULESET_VERSION: &str = "2026.08.1";

/// What a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatCategory {
    ScriptInjection,
    ProtocolInjection,
    EventHandler,
    CssInjection,
    EmbeddedContent,
    FormHijack,
    MetaRedirect,
    AccountNumber,
    CardNumber,
    PasswordKeyword,
    FinancialKeyword,
    PhishingDomain,
    Truncation,
    TypeViolation,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::ScriptInjection => "script-injection",
            ThreatCategory::ProtocolInjection => "protocol-injection",
            ThreatCategory::EventHandler => "event-handler",
            ThreatCategory::CssInjection => "css-injection",
            ThreatCategory::EmbeddedContent => "embedded-content",
            ThreatCategory::FormHijack => "form-hijack",
            ThreatCategory::MetaRedirect => "meta-redirect",
            ThreatCategory::AccountNumber => "account-number",
            ThreatCategory::CardNumber => "card-number",
            ThreatCategory::PasswordKeyword => "password-keyword",
            ThreatCategory::FinancialKeyword => "financial-keyword",
            ThreatCategory::PhishingDomain => "phishing-domain",
            ThreatCategory::Truncation => "truncation",
            ThreatCategory::TypeViolation => "type-violation",
        }
    }
}

/// One compiled detection rule.
#[derive(Debug, Clone)]
pub struct ThreatRule {
    pub id: &'static str,
    pub category: ThreatCategory,
    pub severity: RiskLevel,
    pub pattern: Regex,
}

impl ThreatRule {
    fn new(
        id: &'static str,
        category: ThreatCategory,
        severity: RiskLevel,
        pattern: &str,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            pattern: Regex::new(pattern).expect("threat rule pattern compiles"),
        }
    }
}

/// The full catalogue: hard (blocking) and soft (warning) rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub hard: Vec<ThreatRule>,
    pub soft: Vec<ThreatRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        let hard = vec![
            ThreatRule::new(
                "script-tag",
                ThreatCategory::ScriptInjection,
                RiskLevel::Critical,
                r"(?i)<\s*script\b",
            ),
            ThreatRule::new(
                "javascript-protocol",
                ThreatCategory::ProtocolInjection,
                RiskLevel::High,
                r"(?i)javascript\s*:",
            ),
            ThreatRule::new(
                "vbscript-protocol",
                ThreatCategory::ProtocolInjection,
                RiskLevel::High,
                r"(?i)vbscript\s*:",
            ),
            ThreatRule::new(
                "inline-event-handler",
                ThreatCategory::EventHandler,
                RiskLevel::High,
                r"(?i)\bon[a-z]+\s*=",
            ),
            ThreatRule::new(
                "css-expression",
                ThreatCategory::CssInjection,
                RiskLevel::High,
                r"(?i)expression\s*\(",
            ),
            ThreatRule::new(
                "embedded-object",
                ThreatCategory::EmbeddedContent,
                RiskLevel::High,
                r"(?i)<\s*(object|embed|iframe)\b",
            ),
            ThreatRule::new(
                "form-action-hijack",
                ThreatCategory::FormHijack,
                RiskLevel::High,
                r"(?i)<\s*form\b[^>]*\baction\s*=",
            ),
            ThreatRule::new(
                "meta-refresh",
                ThreatCategory::MetaRedirect,
                RiskLevel::High,
                r#"(?i)<\s*meta\b[^>]*http-equiv\s*=\s*["']?refresh"#,
            ),
        ];

        let soft = vec![
            ThreatRule::new(
                "account-number-shape",
                ThreatCategory::AccountNumber,
                RiskLevel::Medium,
                r"\b\d{8,17}\b",
            ),
            ThreatRule::new(
                "card-number-shape",
                ThreatCategory::CardNumber,
                RiskLevel::Medium,
                r"\b\d(?:[ -]?\d){12,18}\b",
            ),
            ThreatRule::new(
                "password-keyword",
                ThreatCategory::PasswordKeyword,
                RiskLevel::Low,
                r"(?i)\b(password|passwd|pwd|passphrase|pin)\b",
            ),
            ThreatRule::new(
                "financial-keyword",
                ThreatCategory::FinancialKeyword,
                RiskLevel::Low,
                r"(?i)\b(routing number|swift|iban|sort code|cvv|ssn)\b",
            ),
            ThreatRule::new(
                "phishing-domain",
                ThreatCategory::PhishingDomain,
                RiskLevel::Medium,
                r"(?i)\b[a-z0-9-]*(paypa1|bank0f|faceb00k|secure-?login|account-?verify|signin-?update)[a-z0-9.-]*\.(com|net|org|info|xyz)\b",
            ),
        ];

        Self { hard, soft }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(rules: &[ThreatRule], id: &str, input: &str) -> usize {
        rules
            .iter()
            .find(|r| r.id == id)
            .unwrap()
            .pattern
            .find_iter(input)
            .count()
    }

    #[test]
    fn test_script_tag_variants() {
        let rules = RuleSet::new();
        assert_eq!(hits(&rules.hard, "script-tag", "<script>alert(1)</script>"), 1);
        assert_eq!(hits(&rules.hard, "script-tag", "< SCRIPT src=x>"), 1);
        assert_eq!(hits(&rules.hard, "script-tag", "description of a script"), 0);
    }

    #[test]
    fn test_event_handler() {
        let rules = RuleSet::new();
        assert_eq!(
            hits(&rules.hard, "inline-event-handler", r#"<img src=x onerror="alert(1)">"#),
            1
        );
        assert_eq!(hits(&rules.hard, "inline-event-handler", "carbon=low"), 0);
    }

    #[test]
    fn test_protocols() {
        let rules = RuleSet::new();
        assert_eq!(hits(&rules.hard, "javascript-protocol", "javascript:void(0)"), 1);
        assert_eq!(hits(&rules.hard, "javascript-protocol", "JAVASCRIPT : x"), 1);
        assert_eq!(hits(&rules.hard, "vbscript-protocol", "vbscript:msgbox"), 1);
    }

    #[test]
    fn test_form_and_meta() {
        let rules = RuleSet::new();
        assert_eq!(
            hits(&rules.hard, "form-action-hijack", r#"<form method=post action="//evil">"#),
            1
        );
        assert_eq!(
            hits(&rules.hard, "meta-refresh", r#"<meta http-equiv="refresh" content="0;url=//evil">"#),
            1
        );
    }

    #[test]
    fn test_soft_shapes() {
        let rules = RuleSet::new();
        assert_eq!(hits(&rules.soft, "account-number-shape", "acct 123456789012"), 1);
        assert_eq!(hits(&rules.soft, "card-number-shape", "4111 1111 1111 1111"), 1);
        assert_eq!(hits(&rules.soft, "password-keyword", "my Password is"), 1);
        assert_eq!(hits(&rules.soft, "phishing-domain", "visit paypa1-login.com now"), 1);
    }

    #[test]
    fn test_clean_input_no_hits() {
        let rules = RuleSet::new();
        let clean = "transfer 500 to savings";
        for rule in rules.hard.iter().chain(rules.soft.iter()) {
            assert_eq!(
                rule.pattern.find_iter(clean).count(),
                0,
                "rule {} unexpectedly matched",
                rule.id
            );
        }
    }
}
