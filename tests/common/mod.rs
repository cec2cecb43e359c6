//! Shared utilities for integration testing: a mock banking origin served
//! over a real socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A running mock origin.
pub struct MockOrigin {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Origin in `scheme://host:port` form for allow-lists.
    pub origin: String,
    /// Host portion for trusted-origin lists.
    pub host: String,
    /// Total requests served.
    pub hits: Arc<AtomicUsize>,
}

/// Start a mock origin with the routes the pipeline tests exercise.
pub async fn start_mock_origin() -> MockOrigin {
    let hits = Arc::new(AtomicUsize::new(0));

    let accounts_hits = hits.clone();
    let transfer_hits = hits.clone();
    let tainted_hits = hits.clone();
    let oversized_hits = hits.clone();
    let error_hits = hits.clone();

    let app = Router::new()
        .route(
            "/accounts",
            get(move || {
                accounts_hits.fetch_add(1, Ordering::SeqCst);
                async {
                    (
                        security_headers(),
                        Json(json!({"accounts": [{"id": "chk-1", "balance": 1250}]})),
                    )
                }
            }),
        )
        .route(
            "/transfer",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                transfer_hits.fetch_add(1, Ordering::SeqCst);
                let csrf = headers
                    .get("X-CSRF-Token")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                async move {
                    (
                        security_headers(),
                        Json(json!({"status": "accepted", "echo": body, "csrf_seen": csrf})),
                    )
                }
            }),
        )
        .route(
            "/tainted",
            get(move || {
                tainted_hits.fetch_add(1, Ordering::SeqCst);
                async {
                    (
                        security_headers(),
                        Json(json!({"note": "<script>steal()</script>", "ok": true})),
                    )
                }
            }),
        )
        .route(
            "/oversized",
            get(move || {
                oversized_hits.fetch_add(1, Ordering::SeqCst);
                async {
                    (
                        security_headers(),
                        Json(json!({"blob": "x".repeat(4096)})),
                    )
                }
            }),
        )
        .route(
            "/error",
            get(move || {
                error_hits.fetch_add(1, Ordering::SeqCst);
                async {
                    (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error",
                    )
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockOrigin {
        base_url: format!("http://{addr}"),
        origin: format!("http://{addr}"),
        host: addr.ip().to_string(),
        hits,
    }
}

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Strict-Transport-Security", "max-age=31536000".parse().unwrap());
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers
}
