//! Policy composition: presets, overlays, nonce lifecycle, validation.

use arc_swap::ArcSwap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use std::sync::{Arc, Mutex};

use crate::config::{Environment, FeatureFlags, PolicyConfig, ShieldConfig};
use crate::error::SecurityError;
use crate::policy::directives::{Directive, DirectiveSet};

use Directive::*;

type Overlay<'a> = &'a [(Directive, &'a [&'a str])];

/// Base banking policy: everything denied unless explicitly allowed.
const BASE_BANKING: Overlay<'static> = &[
    (DefaultSrc, &["'self'"]),
    (ScriptSrc, &["'self'", "{nonce}"]),
    (StyleSrc, &["'self'", "{nonce}"]),
    (ImgSrc, &["'self'", "data:"]),
    (ConnectSrc, &["'self'"]),
    (FontSrc, &["'self'"]),
    (MediaSrc, &["'none'"]),
    (ObjectSrc, &["'none'"]),
    (FrameSrc, &["'none'"]),
    (ChildSrc, &["'none'"]),
    (WorkerSrc, &["'self'"]),
    (ManifestSrc, &["'self'"]),
    (BaseUri, &["'self'"]),
    (FormAction, &["'self'"]),
    (FrameAncestors, &["'none'"]),
    (UpgradeInsecureRequests, &[]),
    (BlockAllMixedContent, &[]),
];

const DEVELOPMENT_OVERLAY: Overlay<'static> = &[
    (ScriptSrc, &["'unsafe-eval'", "'unsafe-inline'"]),
    (StyleSrc, &["'unsafe-inline'"]),
    (ConnectSrc, &["http://localhost:*", "ws://localhost:*"]),
    (ImgSrc, &["http://localhost:*"]),
];

const TESTING_OVERLAY: Overlay<'static> = &[
    (ConnectSrc, &["https://api.testing.bank.example"]),
];

const PRODUCTION_OVERLAY: Overlay<'static> = &[
    (RequireTrustedTypesFor, &["'script'"]),
    (TrustedTypes, &["default"]),
];

const PAYMENT_OVERLAY: Overlay<'static> = &[
    (ConnectSrc, &["https://payments.bank.example"]),
    (FrameSrc, &["https://secure.payments.bank.example"]),
];

const AUTHENTICATION_OVERLAY: Overlay<'static> = &[
    (ConnectSrc, &["https://auth.bank.example"]),
    (FormAction, &["https://auth.bank.example"]),
];

const ANALYTICS_OVERLAY: Overlay<'static> = &[
    (ConnectSrc, &["https://telemetry.bank.example"]),
    (ImgSrc, &["https://telemetry.bank.example"]),
];

const PWA_OVERLAY: Overlay<'static> = &[
    (ManifestSrc, &["'self'"]),
    (WorkerSrc, &["'self'", "blob:"]),
];

const MOBILE_OVERLAY: Overlay<'static> = &[
    (ConnectSrc, &["https://m.bank.example"]),
    (FontSrc, &["https://m.bank.example"]),
];

const HIGH_SECURITY_OVERLAY: Overlay<'static> = &[
    (RequireTrustedTypesFor, &["'script'"]),
    (TrustedTypes, &["default"]),
];

/// Directives that must be present in any composed policy.
const REQUIRED: [Directive; 4] = [DefaultSrc, ScriptSrc, StyleSrc, ImgSrc];

/// Validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Standard,
    Strict,
}

/// Outcome of policy validation.
#[derive(Debug, Clone)]
pub struct PolicyReport {
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Composes, caches and serializes the CSP for one environment/feature
/// combination. Construct once and share by reference.
pub struct PolicyComposer {
    environment: Environment,
    features: FeatureFlags,
    report: PolicyConfig,
    nonce: Mutex<String>,
    cached: ArcSwap<DirectiveSet>,
}

impl PolicyComposer {
    pub fn new(config: &ShieldConfig) -> Self {
        let set = compose(config.environment, &config.features);
        Self {
            environment: config.environment,
            features: config.features,
            report: config.policy.clone(),
            nonce: Mutex::new(generate_nonce()),
            cached: ArcSwap::from_pointee(set),
        }
    }

    /// The composed directive set (cached; rebuilt only on feature change).
    pub fn directives(&self) -> Arc<DirectiveSet> {
        self.cached.load_full()
    }

    /// Swap in a new feature combination and rebuild the cached set.
    pub fn set_features(&mut self, features: FeatureFlags) {
        self.features = features;
        self.cached
            .store(Arc::new(compose(self.environment, &features)));
    }

    /// The current nonce value.
    pub fn nonce(&self) -> String {
        self.nonce.lock().expect("nonce mutex poisoned").clone()
    }

    /// Generate a fresh nonce (per page navigation) and return it.
    pub fn refresh_nonce(&self) -> String {
        let fresh = generate_nonce();
        *self.nonce.lock().expect("nonce mutex poisoned") = fresh.clone();
        fresh
    }

    /// Response header name, honoring report-only mode.
    pub fn header_name(&self) -> &'static str {
        if self.report.report_only {
            "Content-Security-Policy-Report-Only"
        } else {
            "Content-Security-Policy"
        }
    }

    /// Serialize the policy with the current nonce, appending reporting
    /// directives when configured.
    pub fn header_value(&self) -> String {
        let mut value = self.directives().serialize(&self.nonce());
        if let Some(uri) = &self.report.report_uri {
            value.push_str(&format!("; report-uri {uri}"));
        }
        if let Some(group) = &self.report.report_to {
            value.push_str(&format!("; report-to {group}"));
        }
        value
    }

    /// Validate a directive set against the composition invariants.
    pub fn validate(&self, set: &DirectiveSet, strictness: Strictness) -> PolicyReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for required in REQUIRED {
            if !set.contains(required) {
                errors.push(format!("required directive missing: {required}"));
            }
        }

        for (directive, sources) in set.iter() {
            if !directive.is_boolean() && sources.is_empty() {
                errors.push(format!("directive {directive} has an empty source list"));
            }
            let unsafe_sources: Vec<&String> = sources
                .iter()
                .filter(|s| *s == "'unsafe-eval'" || *s == "'unsafe-inline'")
                .collect();
            if !unsafe_sources.is_empty() && self.environment == Environment::Production {
                for source in unsafe_sources {
                    let message = format!("{directive} permits {source} in production");
                    if strictness == Strictness::Strict {
                        errors.push(message);
                    } else {
                        warnings.push(message);
                    }
                }
            }
        }

        // Clickjacking: frame-ancestors must stay restrictive
        match set.get(FrameAncestors) {
            Some(sources) => {
                let restrictive = sources
                    .iter()
                    .all(|s| s == "'none'" || s == "'self'");
                if !restrictive || sources.iter().any(|s| s == "*") {
                    errors.push("frame-ancestors must be 'none' or 'self'".to_string());
                }
            }
            None => warnings.push("frame-ancestors not set; clickjacking unmitigated".to_string()),
        }

        PolicyReport {
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Syntax checks on a raw header string: balanced quotes and known
    /// directive names only.
    pub fn validate_header_string(&self, header: &str) -> PolicyReport {
        let mut errors = Vec::new();
        let warnings = Vec::new();

        if header.matches('\'').count() % 2 != 0 {
            errors.push("unbalanced quotes in policy header".to_string());
        }

        for segment in header.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let name = segment.split_whitespace().next().unwrap_or_default();
            if name == "report-uri" || name == "report-to" {
                continue;
            }
            if let Err(SecurityError::Configuration(message)) = name.parse::<Directive>() {
                errors.push(message);
            }
        }

        PolicyReport {
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Base preset plus environment and feature overlays, merged by ordered
/// set union.
fn compose(environment: Environment, features: &FeatureFlags) -> DirectiveSet {
    let mut set = DirectiveSet::new();
    set.merge(BASE_BANKING);

    match environment {
        Environment::Development => set.merge(DEVELOPMENT_OVERLAY),
        Environment::Testing => set.merge(TESTING_OVERLAY),
        Environment::Production => set.merge(PRODUCTION_OVERLAY),
    }

    if features.payment {
        set.merge(PAYMENT_OVERLAY);
    }
    if features.authentication {
        set.merge(AUTHENTICATION_OVERLAY);
    }
    if features.analytics {
        set.merge(ANALYTICS_OVERLAY);
    }
    if features.pwa {
        set.merge(PWA_OVERLAY);
    }
    if features.mobile {
        set.merge(MOBILE_OVERLAY);
    }
    if features.high_security {
        set.merge(HIGH_SECURITY_OVERLAY);
    }

    set
}

/// One base64 random value, 128 bits of entropy.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
