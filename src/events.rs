//! Security violation events and the bounded in-memory log.
//!
//! # Responsibilities
//! - Record violations observed by the limiter, sanitizer, token manager
//!   and CSP intake
//! - Keep only the most recent N events (ring buffer, explicit capacity)
//! - Emit structured logs and counters alongside each event
//!
//! # Design Decisions
//! - Events live only for the process lifetime; nothing is persisted
//! - The log is shared by `Arc` and locked briefly per record/read

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::risk::RiskLevel;

/// Default number of retained events.
pub const DEFAULT_LOG_CAPACITY: usize = 256;

/// Category of a recorded security violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Csp,
    Xss,
    Csrf,
    RateLimit,
    General,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Csp => "csp",
            ViolationKind::Xss => "xss",
            ViolationKind::Csrf => "csrf",
            ViolationKind::RateLimit => "rate-limit",
            ViolationKind::General => "general",
        }
    }
}

/// A single recorded violation.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityViolationEvent {
    pub kind: ViolationKind,
    pub severity: RiskLevel,
    pub timestamp: SystemTime,
    pub description: String,
    pub source: String,
}

/// Bounded most-recent-N store for violation events.
pub struct ViolationLog {
    events: Mutex<VecDeque<SecurityViolationEvent>>,
    capacity: usize,
}

impl ViolationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Append an event, evicting the oldest once full.
    pub fn record(&self, kind: ViolationKind, severity: RiskLevel, description: &str, source: &str) {
        tracing::warn!(
            kind = kind.as_str(),
            severity = severity.as_str(),
            source = source,
            "{description}"
        );
        metrics::record_violation(kind.as_str(), severity.as_str());

        let mut events = self.events.lock().expect("violation log mutex poisoned");
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(SecurityViolationEvent {
            kind,
            severity,
            timestamp: SystemTime::now(),
            description: description.to_string(),
            source: source.to_string(),
        });
    }

    /// Snapshot of retained events, oldest first.
    pub fn recent(&self) -> Vec<SecurityViolationEvent> {
        self.events
            .lock()
            .expect("violation log mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().expect("violation log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all retained events (full security reset).
    pub fn clear(&self) {
        self.events.lock().expect("violation log mutex poisoned").clear();
    }
}

impl Default for ViolationLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
