//! Banking-specific request risk classification.
//!
//! Layers a coarse risk assessment on top of base CSRF validation. The path
//! list and amount threshold are configuration defaults carried over from the
//! source deployment; they are examples for a security reviewer to revisit,
//! not vetted policy.

use regex::Regex;

use crate::config::SanitizerConfig;
use crate::risk::RiskLevel;
use crate::token::manager::TokenValidation;

/// Paths whose requests are always at least high risk.
const DEFAULT_HIGH_RISK_PATHS: [&str; 4] = ["transfer", "payment", "loan", "account-close"];

/// A banking request under assessment.
#[derive(Debug, Clone)]
pub struct BankingRequest<'a> {
    pub path: &'a str,
    pub amount: Option<u64>,
    pub account_number: Option<&'a str>,
}

/// Base validation plus the banking risk layer.
#[derive(Debug, Clone)]
pub struct BankingValidation {
    pub base: TokenValidation,
    pub risk: RiskLevel,
    pub warnings: Vec<String>,
}

impl BankingValidation {
    pub fn is_valid(&self) -> bool {
        self.base.is_valid
    }
}

/// Escalates request risk based on path, amount and account shape.
pub struct BankingRiskClassifier {
    high_risk_paths: Vec<String>,
    large_transaction_threshold: u64,
    account_shape: Regex,
}

impl BankingRiskClassifier {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            high_risk_paths: DEFAULT_HIGH_RISK_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            large_transaction_threshold: config.large_transaction_threshold,
            account_shape: Regex::new(r"^\d{8,17}$").expect("account shape pattern compiles"),
        }
    }

    /// Assess a request whose token has already gone through base validation.
    ///
    /// Escalation is monotone: a high-risk path raises to high, a large
    /// amount raises to critical, and a malformed account number only adds a
    /// warning.
    pub fn assess(&self, request: &BankingRequest<'_>, base: TokenValidation) -> BankingValidation {
        let mut risk = RiskLevel::Low;
        let mut warnings = Vec::new();

        let path = request.path.trim_matches('/').to_lowercase();
        if self
            .high_risk_paths
            .iter()
            .any(|candidate| path.split('/').any(|segment| segment == *candidate))
        {
            risk = risk.max(RiskLevel::High);
        }

        if let Some(amount) = request.amount {
            if amount > self.large_transaction_threshold {
                risk = risk.max(RiskLevel::Critical);
            }
        }

        if let Some(account) = request.account_number {
            if !self.account_shape.is_match(account) {
                warnings.push(format!(
                    "account number has unexpected shape ({} chars)",
                    account.len()
                ));
            }
        }

        if risk >= RiskLevel::High {
            tracing::debug!(path = %request.path, risk = risk.as_str(), "banking request escalated");
        }

        BankingValidation {
            base,
            risk,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizerConfig;

    fn classifier() -> BankingRiskClassifier {
        BankingRiskClassifier::new(&SanitizerConfig::default())
    }

    fn valid_base() -> TokenValidation {
        TokenValidation {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_high_risk_path_escalates() {
        let result = classifier().assess(
            &BankingRequest {
                path: "/api/transfer",
                amount: None,
                account_number: None,
            },
            valid_base(),
        );
        assert_eq!(result.risk, RiskLevel::High);
    }

    #[test]
    fn test_large_amount_is_critical() {
        let result = classifier().assess(
            &BankingRequest {
                path: "/api/transfer",
                amount: Some(2_000_000),
                account_number: None,
            },
            valid_base(),
        );
        assert_eq!(result.risk, RiskLevel::Critical);
    }

    #[test]
    fn test_boundary_amount_stays_high() {
        let result = classifier().assess(
            &BankingRequest {
                path: "/api/payment",
                amount: Some(1_000_000),
                account_number: None,
            },
            valid_base(),
        );
        assert_eq!(result.risk, RiskLevel::High);
    }

    #[test]
    fn test_malformed_account_adds_warning_only() {
        let result = classifier().assess(
            &BankingRequest {
                path: "/api/balance",
                amount: None,
                account_number: Some("12-34"),
            },
            valid_base(),
        );
        assert_eq!(result.risk, RiskLevel::Low);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.is_valid());
    }

    #[test]
    fn test_well_formed_account_no_warning() {
        let result = classifier().assess(
            &BankingRequest {
                path: "/api/balance",
                amount: None,
                account_number: Some("123456789012"),
            },
            valid_base(),
        );
        assert!(result.warnings.is_empty());
    }
}
