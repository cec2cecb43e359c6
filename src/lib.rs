//! Client-Side Request Security Library
//!
//! Four cooperating engines — CSRF token lifecycle, pattern-based input
//! sanitization with risk scoring, sliding-window rate limiting and CSP
//! composition — orchestrated by a gateway that sequences them around every
//! outbound call.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                SECURE GATEWAY                 │
//!   caller ─────────▶│  ratelimit ─▶ origin ─▶ token ─▶ sanitize ──▶│──▶ transport
//!                    │                                               │
//!   caller ◀─────────│◀── sanitize ◀── response checks ◀────────────│◀── response
//!                    └──────────────────────────────────────────────┘
//!                    ┌──────────────────────────────────────────────┐
//!                    │           Session / page scope                │
//!                    │   policy (CSP + nonce) ──▶ hardening headers  │
//!                    │   report endpoint ◀── violation reports       │
//!                    └──────────────────────────────────────────────┘
//! ```

// Core engines
pub mod policy;
pub mod ratelimit;
pub mod sanitize;
pub mod token;

// Orchestration
pub mod gateway;
pub mod report;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod events;
pub mod observability;
pub mod risk;

pub use config::ShieldConfig;
pub use error::SecurityError;
pub use events::{SecurityViolationEvent, ViolationKind, ViolationLog};
pub use gateway::{OutboundRequest, RouteClass, SecureGateway};
pub use policy::PolicyComposer;
pub use ratelimit::RateLimiter;
pub use risk::RiskLevel;
pub use sanitize::{ThreatSanitizer, ValidationResult};
pub use token::TokenManager;
