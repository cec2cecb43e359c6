//! CSP violation report intake.
//!
//! Accepts both the legacy `{"csp-report": {...}}` envelope and the native
//! SecurityPolicyViolationEvent field set, records the event, and produces a
//! human-readable remediation suggestion per directive.

use std::sync::Arc;

use serde::Deserialize;

use crate::events::{ViolationKind, ViolationLog};
use crate::risk::RiskLevel;

/// One violation report body. Field aliases cover the camelCase names used
/// by the native event shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CspReport {
    #[serde(alias = "blockedURI")]
    pub blocked_uri: String,
    #[serde(alias = "violatedDirective")]
    pub violated_directive: String,
    #[serde(alias = "effectiveDirective")]
    pub effective_directive: String,
    #[serde(alias = "documentURI")]
    pub document_uri: String,
    #[serde(alias = "sourceFile")]
    pub source_file: String,
    #[serde(alias = "lineNumber")]
    pub line_number: Option<u32>,
    #[serde(alias = "columnNumber")]
    pub column_number: Option<u32>,
}

impl CspReport {
    /// The directive to remediate: effective when present, violated
    /// otherwise.
    fn directive(&self) -> &str {
        if self.effective_directive.is_empty() {
            &self.violated_directive
        } else {
            &self.effective_directive
        }
    }
}

/// Wire shape: enveloped (report-uri POST) or bare (native event JSON).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ViolationReport {
    Enveloped {
        #[serde(rename = "csp-report")]
        csp_report: CspReport,
    },
    Bare(CspReport),
}

impl ViolationReport {
    pub fn into_report(self) -> CspReport {
        match self {
            ViolationReport::Enveloped { csp_report } => csp_report,
            ViolationReport::Bare(report) => report,
        }
    }
}

/// Records incoming violation reports and suggests remediations.
pub struct ViolationIntake {
    log: Arc<ViolationLog>,
}

impl ViolationIntake {
    pub fn new(log: Arc<ViolationLog>) -> Self {
        Self { log }
    }

    /// Record a report and return the remediation suggestion.
    ///
    /// Violations never block anything; they are only logged and counted.
    pub fn ingest(&self, report: &CspReport) -> String {
        let directive = report.directive();
        let severity = if directive.starts_with("script-src") {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        let source = if report.source_file.is_empty() {
            report.document_uri.clone()
        } else {
            match (report.line_number, report.column_number) {
                (Some(line), Some(column)) => {
                    format!("{}:{line}:{column}", report.source_file)
                }
                (Some(line), None) => format!("{}:{line}", report.source_file),
                _ => report.source_file.clone(),
            }
        };

        self.log.record(
            ViolationKind::Csp,
            severity,
            &format!("{} blocked {}", directive, report.blocked_uri),
            &source,
        );

        suggest_remediation(directive, &report.blocked_uri)
    }
}

/// Per-directive remediation text.
fn suggest_remediation(directive: &str, blocked_uri: &str) -> String {
    let base = directive.split(' ').next().unwrap_or(directive);
    match (base, blocked_uri) {
        ("script-src", "inline") | ("style-src", "inline") => {
            format!("move inline content to a resource covered by {base}, or attach the current nonce")
        }
        ("script-src", "eval") => {
            "remove eval()/new Function() usage; 'unsafe-eval' is not permitted".to_string()
        }
        (_, "") => format!("review {base}; the blocked resource did not carry a URI"),
        (_, uri) => format!("add {uri} to {base} if the resource is legitimate"),
    }
}
