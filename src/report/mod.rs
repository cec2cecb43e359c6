//! Violation reporting endpoint.
//!
//! # Responsibilities
//! - Accept `POST /csp-report` with either report wire shape
//! - Respond `204 No Content` on success
//! - Bound request body size before parsing
//!
//! # Design Decisions
//! - Browsers send `Content-Type: application/csp-report`, so the body is
//!   read raw and parsed manually instead of through the `Json` extractor
//! - Malformed reports get `400`; they never reach the violation log

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::policy::violations::{ViolationIntake, ViolationReport};

const MAX_REPORT_BYTES: usize = 64 * 1024;

/// Build the reporting router around a shared intake.
pub fn report_router(intake: Arc<ViolationIntake>) -> Router {
    Router::new()
        .route("/csp-report", post(receive_report))
        .with_state(intake)
        .layer(RequestBodyLimitLayer::new(MAX_REPORT_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn receive_report(
    State(intake): State<Arc<ViolationIntake>>,
    body: Bytes,
) -> StatusCode {
    match serde_json::from_slice::<ViolationReport>(&body) {
        Ok(report) => {
            let report = report.into_report();
            let suggestion = intake.ingest(&report);
            tracing::debug!(
                blocked_uri = %report.blocked_uri,
                suggestion = %suggestion,
                "CSP violation report accepted"
            );
            StatusCode::NO_CONTENT
        }
        Err(error) => {
            tracing::debug!(%error, "rejected malformed violation report");
            StatusCode::BAD_REQUEST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ViolationLog;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router_with_log() -> (Router, Arc<ViolationLog>) {
        let log = Arc::new(ViolationLog::default());
        let intake = Arc::new(ViolationIntake::new(log.clone()));
        (report_router(intake), log)
    }

    fn post_report(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/csp-report")
            .header("content-type", "application/csp-report")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_enveloped_report_returns_204() {
        let (router, log) = router_with_log();
        let body = r#"{"csp-report":{"blocked-uri":"https://evil.example/x.js","effective-directive":"script-src"}}"#;
        let response = router.oneshot(post_report(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_native_report_returns_204() {
        let (router, log) = router_with_log();
        let body = r#"{"blockedURI":"inline","effectiveDirective":"style-src"}"#;
        let response = router.oneshot(post_report(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_report_returns_400() {
        let (router, log) = router_with_log();
        let response = router.oneshot(post_report("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(log.is_empty());
    }
}
