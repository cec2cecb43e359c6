//! Input threat detection and sanitization.
//!
//! # Data Flow
//! ```text
//! input → truncate → hard rule scan (findings)
//!       → soft rule scan when banking mode (warnings)
//!       → strip / encode → strict-mode pass
//!       → risk scoring → ValidationResult
//! ```
//!
//! # Design Decisions
//! - The threat catalogue is table driven and versioned; control flow never
//!   changes when rules are added
//! - Findings and warnings are returned, never thrown; callers decide policy

pub mod monitor;
pub mod rules;
pub mod sanitizer;

pub use monitor::InputMonitor;
pub use rules::{RuleSet, ThreatCategory, ThreatRule, RULESET_VERSION};
pub use sanitizer::{
    BankingField, Finding, FormValidation, SanitizeOptions, ThreatSanitizer, ValidationResult,
};
