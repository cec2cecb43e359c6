//! Continuous input monitoring.
//!
//! Attaches the sanitizer to a live stream of input edits (change/paste
//! events from the hosting environment) and re-validates every value. When
//! risk reaches high the value is auto-replaced with its sanitized form
//! before being forwarded; a caller-supplied callback fires on every threat.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::risk::RiskLevel;
use crate::sanitize::sanitizer::{SanitizeOptions, ThreatSanitizer, ValidationResult};

/// Handle to a spawned monitoring task.
pub struct InputMonitor {
    handle: JoinHandle<()>,
}

impl InputMonitor {
    /// Attach to an input stream. Each received value is validated; the
    /// forwarded value is the sanitized form whenever risk is high or
    /// critical, otherwise the original. The task ends when the input
    /// channel closes.
    pub fn attach<F>(
        sanitizer: Arc<ThreatSanitizer>,
        options: SanitizeOptions,
        mut input: mpsc::Receiver<String>,
        output: mpsc::Sender<String>,
        on_threat: F,
    ) -> Self
    where
        F: Fn(&ValidationResult) + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            while let Some(value) = input.recv().await {
                let result = sanitizer.validate(&value, &options);
                if !result.findings.is_empty() {
                    on_threat(&result);
                }
                let forwarded = if result.risk_level >= RiskLevel::High {
                    tracing::warn!(
                        risk = result.risk_level.as_str(),
                        "live input auto-replaced with sanitized value"
                    );
                    result.sanitized_value
                } else {
                    value
                };
                if output.send(forwarded).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Detach, aborting the monitoring task.
    pub fn detach(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SanitizerConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_benign_input_passes_through() {
        let sanitizer = Arc::new(ThreatSanitizer::new(&SanitizerConfig::default()));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let _monitor = InputMonitor::attach(
            sanitizer,
            SanitizeOptions::default(),
            in_rx,
            out_tx,
            |_| {},
        );

        in_tx.send("hello there".to_string()).await.unwrap();
        assert_eq!(out_rx.recv().await.unwrap(), "hello there");
    }

    #[tokio::test]
    async fn test_threat_replaced_and_callback_fires() {
        let sanitizer = Arc::new(ThreatSanitizer::new(&SanitizerConfig::default()));
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let threats = Arc::new(AtomicUsize::new(0));
        let counter = threats.clone();
        let _monitor = InputMonitor::attach(
            sanitizer,
            SanitizeOptions::default(),
            in_rx,
            out_tx,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        in_tx
            .send("<script>alert(1)</script>".to_string())
            .await
            .unwrap();
        let forwarded = out_rx.recv().await.unwrap();
        assert!(!forwarded.contains("<script>"));
        assert_eq!(threats.load(Ordering::SeqCst), 1);
    }
}
