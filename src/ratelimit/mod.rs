//! Sliding-window rate limiting.
//!
//! # Responsibilities
//! - Admit or deny requests per caller identifier
//! - Block saturating identifiers for a configured duration
//! - Prune stale timestamps lazily on each check
//!
//! # Design Decisions
//! - Windows live in one `Mutex<HashMap>`; checks are short critical
//!   sections, matching the single-writer model of the source
//! - A denied or aborted attempt still consumes quota; retries cannot
//!   bypass the limiter

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RateLimitPolicy;
use crate::events::{ViolationKind, ViolationLog};
use crate::observability::metrics;
use crate::risk::RiskLevel;

/// Per-identifier sliding window state.
#[derive(Debug, Default)]
struct RateWindow {
    timestamps: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(first) = self.timestamps.front() {
            if now.duration_since(*first) > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window request admission control.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    violations: Arc<ViolationLog>,
}

impl RateLimiter {
    pub fn new(violations: Arc<ViolationLog>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            violations,
        }
    }

    /// Admit or deny one request for `identifier`.
    ///
    /// A blocked identifier is denied without recording. When the pruned
    /// window is already full the identifier is blocked for
    /// `block_duration_ms` and a rate-limit violation is recorded. Otherwise
    /// the attempt is recorded and admitted.
    pub fn is_allowed(&self, identifier: &str, policy: &RateLimitPolicy) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let window = windows.entry(identifier.to_string()).or_default();

        if let Some(blocked_until) = window.blocked_until {
            if now < blocked_until {
                return false;
            }
            window.blocked_until = None;
        }

        window.prune(now, Duration::from_millis(policy.window_ms));

        if window.timestamps.len() >= policy.max_requests {
            window.blocked_until = Some(now + Duration::from_millis(policy.block_duration_ms));
            drop(windows);
            metrics::record_rate_limited(metric_class(identifier));
            self.violations.record(
                ViolationKind::RateLimit,
                RiskLevel::Medium,
                &format!(
                    "identifier exceeded {} requests per {}ms",
                    policy.max_requests, policy.window_ms
                ),
                identifier,
            );
            return false;
        }

        window.timestamps.push_back(now);
        true
    }

    /// Read-only count of timestamps currently inside the window.
    pub fn request_count(&self, identifier: &str, policy: &RateLimitPolicy) -> usize {
        let now = Instant::now();
        let window = Duration::from_millis(policy.window_ms);
        let windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows
            .get(identifier)
            .map(|w| {
                w.timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) <= window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether `identifier` is currently serving a block.
    pub fn is_blocked(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows
            .get(identifier)
            .and_then(|w| w.blocked_until)
            .is_some_and(|until| now < until)
    }

    /// Drop all windows and blocks (tests, full security reset).
    pub fn clear_history(&self) {
        self.windows
            .lock()
            .expect("rate limiter mutex poisoned")
            .clear();
    }
}

/// Route-class suffix of a `session:class` identifier. Metric labels carry
/// only the class, never the session, so label cardinality stays bounded.
fn metric_class(identifier: &str) -> &str {
    identifier.rsplit(':').next().unwrap_or(identifier)
}
