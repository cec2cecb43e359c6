//! Content-Security-Policy composition.
//!
//! # Data Flow
//! ```text
//! banking base preset → environment overlay → feature overlays
//!     → ordered-set union per directive → cached DirectiveSet
//!     → header_value() with fresh nonce interpolation
//! violation report → intake → ring buffer + remediation suggestion
//! ```
//!
//! # Design Decisions
//! - Overlays only ever add sources (union); nothing replaces a directive
//! - Serialization order is insertion order of first appearance, so header
//!   output is stable and snapshot-testable

pub mod composer;
pub mod directives;
pub mod violations;

pub use composer::{PolicyComposer, PolicyReport, Strictness};
pub use directives::{Directive, DirectiveSet};
pub use violations::{CspReport, ViolationIntake, ViolationReport};
