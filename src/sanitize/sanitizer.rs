//! The sanitizer engine: scanning, encoding, stripping and risk scoring.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::config::SanitizerConfig;
use crate::observability::metrics;
use crate::risk::RiskLevel;
use crate::sanitize::rules::{RuleSet, ThreatCategory};

/// Risk-scoring cutoffs. Carried over from the source deployment as
/// defaults; revisit before relying on them as policy.
const CRITICAL_FINDING_COUNT: usize = 3;
const MEDIUM_WARNING_COUNT: usize = 3;
const MEDIUM_REMOVAL_RATIO: f64 = 0.30;

/// Per-call sanitization options.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Inputs longer than this (in characters) are truncated first.
    pub max_length: usize,
    /// Permit an allow-list of HTML tags instead of encoding everything.
    pub allow_html: bool,
    /// Tag names kept when `allow_html` is set. Attributes are always dropped.
    pub allowed_tags: Vec<String>,
    /// Additionally strip angle brackets, protocols, handlers and
    /// `expression(` from the encoded output.
    pub strict_mode: bool,
    /// Run the soft banking rules and record warnings.
    pub banking_mode: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_length: 10_000,
            allow_html: false,
            allowed_tags: vec!["b".into(), "i".into(), "em".into(), "strong".into(), "p".into(), "br".into()],
            strict_mode: false,
            banking_mode: false,
        }
    }
}

/// A single rule hit (or synthetic event such as truncation).
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule_id: String,
    #[serde(serialize_with = "serialize_category")]
    pub category: ThreatCategory,
    pub occurrences: usize,
}

fn serialize_category<S: serde::Serializer>(
    category: &ThreatCategory,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(category.as_str())
}

/// Outcome of validating one input value. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub sanitized_value: String,
    pub findings: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub risk_level: RiskLevel,
}

/// Outcome of validating a whole form.
#[derive(Debug, Clone, Serialize)]
pub struct FormValidation {
    pub is_valid: bool,
    pub sanitized_data: serde_json::Map<String, Value>,
    pub field_results: HashMap<String, ValidationResult>,
    pub overall_risk: RiskLevel,
}

/// Fixed per-field presets for banking inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankingField {
    Account,
    Amount,
    Memo,
    Name,
    General,
}

impl BankingField {
    fn options(&self) -> SanitizeOptions {
        let max_length = match self {
            BankingField::Account => 20,
            BankingField::Amount => 15,
            BankingField::Memo => 200,
            BankingField::Name => 100,
            BankingField::General => 500,
        };
        SanitizeOptions {
            max_length,
            allow_html: false,
            allowed_tags: Vec::new(),
            strict_mode: true,
            banking_mode: true,
        }
    }
}

/// Pattern-based input validator and sanitizer with reproducible risk
/// scoring. Cheap to share behind an `Arc`; scanning never mutates state.
pub struct ThreatSanitizer {
    rules: RuleSet,
    default_max_length: usize,
    tag: Regex,
    script_element: Regex,
    style_element: Regex,
    strict_protocol: Regex,
    strict_handler: Regex,
    strict_expression: Regex,
    entity_or_syntax: Regex,
}

impl ThreatSanitizer {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            rules: RuleSet::new(),
            default_max_length: config.max_input_length,
            tag: Regex::new(r"(?is)<\s*(/?)\s*([a-z][a-z0-9]*)\b[^>]*>")
                .expect("tag pattern compiles"),
            script_element: Regex::new(r"(?is)<\s*script\b[^>]*>.*?(</\s*script\s*>|$)")
                .expect("script element pattern compiles"),
            style_element: Regex::new(r"(?is)<\s*style\b[^>]*>.*?(</\s*style\s*>|$)")
                .expect("style element pattern compiles"),
            strict_protocol: Regex::new(r"(?i)(javascript|vbscript|data)\s*:")
                .expect("protocol pattern compiles"),
            strict_handler: Regex::new(r"(?i)\bon[a-z]+\s*(=|&#x3D;)")
                .expect("handler pattern compiles"),
            strict_expression: Regex::new(r"(?i)expression\s*\(")
                .expect("expression pattern compiles"),
            entity_or_syntax: Regex::new(
                r#"&[a-zA-Z][a-zA-Z0-9]*;|&#x[0-9a-fA-F]+;|&#[0-9]+;|[&<>"'/=`]"#,
            )
            .expect("entity pattern compiles"),
        }
    }

    /// Validate and sanitize one string input.
    pub fn validate(&self, input: &str, options: &SanitizeOptions) -> ValidationResult {
        let mut warnings = Vec::new();

        // 1. Length cap
        let max = if options.max_length > 0 {
            options.max_length
        } else {
            self.default_max_length
        };
        let truncated: String;
        let text = if input.chars().count() > max {
            truncated = input.chars().take(max).collect();
            warnings.push(Finding {
                rule_id: "input-truncated".to_string(),
                category: ThreatCategory::Truncation,
                occurrences: 1,
            });
            truncated.as_str()
        } else {
            input
        };

        // 2. Hard threat scan
        let mut findings = Vec::new();
        for rule in &self.rules.hard {
            let occurrences = rule.pattern.find_iter(text).count();
            if occurrences > 0 {
                metrics::record_threat(rule.id);
                findings.push(Finding {
                    rule_id: rule.id.to_string(),
                    category: rule.category,
                    occurrences,
                });
            }
        }

        // 3. Soft banking scan
        if options.banking_mode {
            for rule in &self.rules.soft {
                let occurrences = rule.pattern.find_iter(text).count();
                if occurrences > 0 {
                    warnings.push(Finding {
                        rule_id: rule.id.to_string(),
                        category: rule.category,
                        occurrences,
                    });
                }
            }
        }

        // 4. Sanitize
        let original_chars = text.chars().count().max(1);
        let mut removed_chars = 0usize;
        let mut sanitized = if options.allow_html {
            self.strip_disallowed_html(text, &options.allowed_tags, &mut removed_chars)
        } else {
            self.encode_entities(text)
        };
        if options.strict_mode {
            sanitized = self.strict_strip(&sanitized, &mut removed_chars);
        }

        // 5. Risk scoring. Each pattern match is a finding.
        let hard_count: usize = findings.iter().map(|f| f.occurrences).sum();
        let soft_count: usize = warnings
            .iter()
            .filter(|f| f.category != ThreatCategory::Truncation)
            .map(|f| f.occurrences)
            .sum();
        let removal_ratio = removed_chars as f64 / original_chars as f64;
        let risk_level = if hard_count >= CRITICAL_FINDING_COUNT {
            RiskLevel::Critical
        } else if hard_count >= 1 {
            RiskLevel::High
        } else if soft_count >= MEDIUM_WARNING_COUNT || removal_ratio > MEDIUM_REMOVAL_RATIO {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        ValidationResult {
            is_valid: findings.is_empty(),
            sanitized_value: sanitized,
            findings,
            warnings,
            risk_level,
        }
    }

    /// Validate an arbitrary JSON value. Anything but a string is rejected
    /// with a type error.
    pub fn validate_value(&self, value: &Value, options: &SanitizeOptions) -> ValidationResult {
        match value {
            Value::String(s) => self.validate(s, options),
            other => ValidationResult {
                is_valid: false,
                sanitized_value: String::new(),
                findings: vec![Finding {
                    rule_id: "non-string-input".to_string(),
                    category: ThreatCategory::TypeViolation,
                    occurrences: 1,
                }],
                warnings: vec![Finding {
                    rule_id: format!("expected string, got {}", json_type(other)),
                    category: ThreatCategory::TypeViolation,
                    occurrences: 1,
                }],
                risk_level: RiskLevel::Low,
            },
        }
    }

    /// Validate one banking field with its fixed preset.
    pub fn validate_banking_input(&self, input: &str, field: BankingField) -> ValidationResult {
        self.validate(input, &field.options())
    }

    /// Validate every string field of a form independently.
    ///
    /// Non-string fields pass through unchanged; `overall_risk` is the
    /// maximum severity observed across validated fields.
    pub fn validate_form_data(
        &self,
        data: &serde_json::Map<String, Value>,
        per_field: Option<&HashMap<String, SanitizeOptions>>,
    ) -> FormValidation {
        let defaults = SanitizeOptions::default();
        let mut sanitized_data = serde_json::Map::new();
        let mut field_results = HashMap::new();
        let mut overall_risk = RiskLevel::Low;
        let mut is_valid = true;

        for (name, value) in data {
            match value {
                Value::String(s) => {
                    let options = per_field
                        .and_then(|m| m.get(name))
                        .unwrap_or(&defaults);
                    let result = self.validate(s, options);
                    overall_risk = overall_risk.max(result.risk_level);
                    is_valid &= result.is_valid;
                    sanitized_data.insert(name.clone(), Value::String(result.sanitized_value.clone()));
                    field_results.insert(name.clone(), result);
                }
                other => {
                    sanitized_data.insert(name.clone(), other.clone());
                }
            }
        }

        FormValidation {
            is_valid,
            sanitized_data,
            field_results,
            overall_risk,
        }
    }

    /// Remove `<script>`/`<style>` elements with their contents, then drop
    /// every tag whose name is not allow-listed. Allowed tags are re-emitted
    /// bare, so attributes never survive.
    fn strip_disallowed_html(
        &self,
        text: &str,
        allowed_tags: &[String],
        removed_chars: &mut usize,
    ) -> String {
        let before = text.chars().count();
        let without_scripts = self.script_element.replace_all(text, "");
        let without_styles = self.style_element.replace_all(&without_scripts, "");
        let stripped = self
            .tag
            .replace_all(&without_styles, |caps: &regex::Captures<'_>| {
                let closing = &caps[1];
                let name = caps[2].to_lowercase();
                if allowed_tags.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
                    format!("<{closing}{name}>")
                } else {
                    String::new()
                }
            })
            .into_owned();
        *removed_chars += before.saturating_sub(stripped.chars().count());
        stripped
    }

    /// Full HTML entity encoding of every character the sanitizer treats as
    /// syntax: `& < > " ' / backtick =`. An `&` that already begins a
    /// character reference is left alone, so encoding an encoded string is a
    /// no-op.
    fn encode_entities(&self, input: &str) -> String {
        self.entity_or_syntax
            .replace_all(input, |caps: &regex::Captures<'_>| match &caps[0] {
                "/" => "&#x2F;".to_string(),
                "`" => "&#x60;".to_string(),
                "=" => "&#x3D;".to_string(),
                m if m.len() > 1 => m.to_string(),
                m => html_escape::encode_safe(m).into_owned(),
            })
            .into_owned()
    }

    /// Strict pass over already-encoded output.
    fn strict_strip(&self, text: &str, removed_chars: &mut usize) -> String {
        let before = text.chars().count();
        let no_brackets: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();
        let no_protocols = self.strict_protocol.replace_all(&no_brackets, "");
        let no_handlers = self.strict_handler.replace_all(&no_protocols, "");
        let cleaned = self
            .strict_expression
            .replace_all(&no_handlers, "")
            .into_owned();
        *removed_chars += before.saturating_sub(cleaned.chars().count());
        cleaned
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitizer() -> ThreatSanitizer {
        ThreatSanitizer::new(&SanitizerConfig::default())
    }

    #[test]
    fn test_script_detection_is_high_risk() {
        let result = sanitizer().validate("<script>alert(1)</script>", &SanitizeOptions::default());
        assert!(!result.is_valid);
        assert!(!result.findings.is_empty());
        assert!(result.risk_level >= RiskLevel::High);
        assert!(!result.sanitized_value.contains('<'));
    }

    #[test]
    fn test_onerror_flagged_and_removed() {
        let result = sanitizer().validate(
            r#"<img src=x onerror="alert(1)">"#,
            &SanitizeOptions {
                strict_mode: true,
                ..SanitizeOptions::default()
            },
        );
        assert!(!result.is_valid);
        assert!(result
            .findings
            .iter()
            .any(|f| f.rule_id == "inline-event-handler"));
        assert!(!result.sanitized_value.contains("onerror="));
        assert!(!result.sanitized_value.to_lowercase().contains("onerror&#x3d;"));
    }

    #[test]
    fn test_three_findings_is_critical() {
        let input = "<script>x</script> javascript:a javascript:b";
        let result = sanitizer().validate(input, &SanitizeOptions::default());
        let total: usize = result.findings.iter().map(|f| f.occurrences).sum();
        assert!(total >= 3);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_clean_input_is_low_and_idempotent() {
        let s = sanitizer();
        let options = SanitizeOptions::default();
        for input in [
            "plain text 42",
            "transfer to savings",
            "john doe",
            "fish & chips",
            "o'clock",
            "a/b = c",
            r#"memo: "urgent" & final"#,
        ] {
            let once = s.validate(input, &options);
            assert!(once.is_valid, "{input:?} flagged: {:?}", once.findings);
            assert_eq!(once.risk_level, RiskLevel::Low);
            let twice = s.validate(&once.sanitized_value, &options);
            assert_eq!(once.sanitized_value, twice.sanitized_value, "for {input:?}");
        }
    }

    #[test]
    fn test_existing_entities_not_reencoded() {
        let result = sanitizer().validate("fish &amp; chips &#x2F; peas", &SanitizeOptions::default());
        assert_eq!(result.sanitized_value, "fish &amp; chips &#x2F; peas");
    }

    #[test]
    fn test_entity_encoding_covers_full_set() {
        let result = sanitizer().validate(r#"a&b<c>d"e'f/g`h=i"#, &SanitizeOptions::default());
        let sanitized = &result.sanitized_value;
        for forbidden in ['<', '>', '"', '\'', '/', '`', '='] {
            assert!(
                !sanitized.contains(forbidden),
                "{forbidden:?} survived in {sanitized}"
            );
        }
        assert!(sanitized.contains("&amp;"));
    }

    #[test]
    fn test_truncation_recorded() {
        let result = sanitizer().validate(
            &"a".repeat(50),
            &SanitizeOptions {
                max_length: 10,
                ..SanitizeOptions::default()
            },
        );
        assert_eq!(result.sanitized_value.chars().count(), 10);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.category == ThreatCategory::Truncation));
    }

    #[test]
    fn test_allow_html_keeps_allowed_strips_rest() {
        let result = sanitizer().validate(
            r#"<p onclick="x">hi</p><div>bye</div><style>body{}</style>"#,
            &SanitizeOptions {
                allow_html: true,
                allowed_tags: vec!["p".into()],
                ..SanitizeOptions::default()
            },
        );
        assert_eq!(result.sanitized_value, "<p>hi</p>bye");
    }

    #[test]
    fn test_script_contents_always_removed_in_html_mode() {
        let result = sanitizer().validate(
            "before<script>steal()</script>after",
            &SanitizeOptions {
                allow_html: true,
                ..SanitizeOptions::default()
            },
        );
        assert_eq!(result.sanitized_value, "beforeafter");
    }

    #[test]
    fn test_heavy_stripping_is_medium() {
        // No hard findings, but most characters removed by tag stripping
        let result = sanitizer().validate(
            "<div><span><table><tr><td>x</td></tr></table></span></div>",
            &SanitizeOptions {
                allow_html: true,
                allowed_tags: Vec::new(),
                ..SanitizeOptions::default()
            },
        );
        assert!(result.findings.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_banking_mode_soft_warnings() {
        let result = sanitizer().validate(
            "send to account 123456789012, password hunter2, see paypa1-login.com",
            &SanitizeOptions {
                banking_mode: true,
                ..SanitizeOptions::default()
            },
        );
        assert!(result.is_valid);
        assert!(result.warnings.len() >= 3);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_banking_field_presets() {
        let s = sanitizer();
        let result = s.validate_banking_input(&"9".repeat(40), BankingField::Account);
        assert_eq!(result.sanitized_value.chars().count(), 20);

        let memo = s.validate_banking_input("<b>rent</b>", BankingField::Memo);
        assert!(!memo.sanitized_value.contains('<'));
    }

    #[test]
    fn test_validate_value_rejects_non_string() {
        let result = sanitizer().validate_value(&json!(42), &SanitizeOptions::default());
        assert!(!result.is_valid);
        assert_eq!(result.findings[0].category, ThreatCategory::TypeViolation);
    }

    #[test]
    fn test_form_data_mixed_fields() {
        let s = sanitizer();
        let data = json!({
            "memo": "<script>x</script>",
            "name": "alice",
            "amount": 250
        });
        let result = s.validate_form_data(data.as_object().unwrap(), None);
        assert!(!result.is_valid);
        assert_eq!(result.overall_risk, RiskLevel::High);
        // Non-string passes through unchanged
        assert_eq!(result.sanitized_data["amount"], json!(250));
        assert!(!result.field_results.contains_key("amount"));
        assert!(result.field_results["name"].is_valid);
    }

    #[test]
    fn test_form_data_per_field_overrides() {
        let s = sanitizer();
        let data = json!({ "memo": "hello world" });
        let mut overrides = HashMap::new();
        overrides.insert(
            "memo".to_string(),
            SanitizeOptions {
                max_length: 5,
                ..SanitizeOptions::default()
            },
        );
        let result = s.validate_form_data(data.as_object().unwrap(), Some(&overrides));
        assert_eq!(result.sanitized_data["memo"], json!("hello"));
    }
}
