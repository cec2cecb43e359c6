//! Configuration for the request-security subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs (parse) → validation.rs (semantic checks)
//!           → ShieldConfig consumed by token/sanitize/ratelimit/policy/gateway
//! ```
//!
//! # Design Decisions
//! - Everything has a working default so tests and demos need no file
//! - Validation is a pure function that collects all errors, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use schema::{
    CsrfConfig, Environment, FeatureFlags, GatewayConfig, PolicyConfig, RateLimitPolicy,
    RateLimits, SanitizerConfig, SecurityLevel, ShieldConfig,
};
