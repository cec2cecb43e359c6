//! CSRF token lifecycle.
//!
//! # Data Flow
//! ```text
//! issue(session)   → signed opaque token + live-store entry
//! validate(token)  → constant-time MAC check → session/expiry/revocation
//!                    → origin allow-list check
//! invalidate(...)  → logout / session teardown
//! ```
//!
//! # Design Decisions
//! - Tokens are self-describing (payload travels inside the token) but still
//!   require a live-store entry, so revocation is immediate
//! - All secret-derived comparisons are constant time

pub mod banking;
pub mod cookie;
pub mod manager;

pub use banking::{BankingRequest, BankingRiskClassifier, BankingValidation};
pub use cookie::token_cookie;
pub use manager::{IssuedToken, RequestContext, TokenFailure, TokenManager, TokenValidation};
