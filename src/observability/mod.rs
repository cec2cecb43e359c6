//! Observability helpers.
//!
//! # Design Decisions
//! - The crate records through the `metrics` facade only; installing a
//!   recorder/exporter is the embedding application's job
//! - Structured logs go through `tracing` at the call sites themselves

pub mod metrics;
