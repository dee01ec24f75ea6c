//! Integration tests for the source clients
//!
//! Each test binds a throwaway axum stub on 127.0.0.1:0 to stand in for the
//! downstream service, then exercises the real client against it.

use axum::extract::{Path, Query};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use spyglass_sources::{
    ComponentPoller, GlobalLedgerGate, LedgerMirrorClient, SourceError, StorageMetadataClient,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn receipt_header(id: &str, phase: &str) -> Value {
    json!({
        "receipt_id": id,
        "phase": phase,
        "task_id": format!("task-{}", id),
        "root_task_id": "root-1",
        "tenant_id": "acme",
        "created_at": "2026-03-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_mirror_query_parses_headers() {
    let app = Router::new().route(
        "/receipts/search",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("tenant_id").unwrap(), "acme");
            assert_eq!(params.get("limit").unwrap(), "25");
            Json(json!({
                "receipts": [receipt_header("r-1", "accepted"), receipt_header("r-2", "complete")]
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let client = LedgerMirrorClient::new(Some(base));
    let headers = client
        .query_receipt_headers("acme", "root-1", None, None, chrono::Utc::now(), 25)
        .await
        .unwrap();

    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].receipt_id, "r-1");
    assert_eq!(headers[1].phase, "complete");
}

#[tokio::test]
async fn test_mirror_get_distinguishes_absent_from_unavailable() {
    let app = Router::new().route(
        "/receipts/:id",
        get(|Path(id): Path<String>| async move {
            if id == "r-known" {
                Json(json!({
                    "receipt_id": "r-known",
                    "tenant_id": "acme",
                    "task_id": "t-1",
                    "phase": "complete",
                    "task_type": "shipment_manifest",
                    "artifact_pointer": "depot://manifest-1"
                }))
                .into_response()
            } else {
                axum::http::StatusCode::NOT_FOUND.into_response()
            }
        }),
    );
    let base = spawn_stub(app).await;

    let client = LedgerMirrorClient::new(Some(base));

    let found = client.get_receipt("acme", "r-known").await.unwrap();
    let receipt = found.expect("known receipt should be returned");
    assert_eq!(receipt.task_type.as_deref(), Some("shipment_manifest"));

    // Absent is a negative result, not an error
    let absent = client.get_receipt("acme", "r-missing").await.unwrap();
    assert!(absent.is_none());
}

#[tokio::test]
async fn test_mirror_malformed_payload_fails_closed() {
    let app = Router::new().route(
        "/receipts/:id",
        get(|| async { Json(json!({"unexpected": "shape"})) }),
    );
    let base = spawn_stub(app).await;

    let client = LedgerMirrorClient::new(Some(base));
    let result = client.get_receipt("acme", "r-1").await;

    assert!(matches!(result, Err(SourceError::Unavailable(_))));
}

fn test_poller(endpoint: String, max_calls: u32) -> ComponentPoller {
    ComponentPoller::new(
        Some(endpoint),
        "gate".to_string(),
        Duration::from_millis(500),
        Duration::from_secs(5),
        Duration::from_secs(60),
        max_calls,
    )
}

#[tokio::test]
async fn test_poller_health_caches_and_skips_rate_budget() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_handle = hits.clone();
    let app = Router::new().route(
        "/health",
        get(move || {
            let hits = hits_handle.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "component_id": "gate",
                    "version": "2.4.1",
                    "uptime_seconds": 86400,
                    "error_budget_status": "healthy"
                }))
            }
        }),
    );
    let base = spawn_stub(app).await;

    // One call per window; the cache must absorb everything after the first
    let poller = test_poller(base, 1);

    let (snapshot, age_ms) = poller.poll_health("acme", false).await.unwrap();
    assert_eq!(snapshot.version.as_deref(), Some("2.4.1"));
    assert_eq!(age_ms, 0);

    let (cached, _) = poller.poll_health("acme", false).await.unwrap();
    assert_eq!(cached.uptime_seconds, Some(86400));
    assert_eq!(hits.load(Ordering::SeqCst), 1, "second poll must come from cache");

    // A different request shape misses the cache and finds the budget gone
    let result = poller.poll_health("acme", true).await;
    assert!(matches!(result, Err(SourceError::RateLimited(_))));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_poller_queue_truncates_items() {
    let app = Router::new().route(
        "/queues/diagnostics",
        get(|| async {
            let items: Vec<Value> = (0..10)
                .map(|i| {
                    json!({
                        "task_id": format!("t-{}", i),
                        "task_type": "render",
                        "status": "queued",
                        "priority": 0,
                        "age_ms": 100 * i
                    })
                })
                .collect();
            Json(json!({
                "queue_depth": 10,
                "oldest_item_age_ms": 900,
                "active_leases_count": 2,
                "items": items
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let poller = test_poller(base, 60);
    let (snapshot, _) = poller.poll_queue("acme", None, 3, true).await.unwrap();

    assert_eq!(snapshot.queue_depth, 10);
    assert_eq!(snapshot.items.len(), 3, "items must be truncated to the limit");
}

#[tokio::test]
async fn test_poller_queue_drops_items_without_examples() {
    let app = Router::new().route(
        "/queues/diagnostics",
        get(|| async {
            Json(json!({
                "queue_depth": 4,
                "items": [{"task_id": "t-1", "task_type": "render", "status": "queued"}]
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let poller = test_poller(base, 60);
    let (snapshot, _) = poller.poll_queue("acme", None, 20, false).await.unwrap();

    assert_eq!(snapshot.queue_depth, 4);
    assert!(snapshot.items.is_empty());
}

#[tokio::test]
async fn test_depot_returns_pointers_and_counts() {
    let app = Router::new().route(
        "/artifacts/metadata",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("root_task_id").unwrap(), "root-1");
            Json(json!({
                "artifacts": [{
                    "artifact_id": "a-1",
                    "root_task_id": "root-1",
                    "mime_type": "application/pdf",
                    "size_bytes": 4096,
                    "artifact_role": "final_output",
                    "location": "depot://bucket/a-1"
                }],
                "shipment_manifest_pointer": "depot://bucket/manifest",
                "staged_counts": {"plan": 1, "final_output": 1}
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let client = StorageMetadataClient::new(Some(base));
    let inventory = client
        .list_artifacts("acme", Some("root-1"), None, 100)
        .await
        .unwrap();

    assert_eq!(inventory.artifact_pointers.len(), 1);
    assert_eq!(
        inventory.shipment_manifest_pointer.as_deref(),
        Some("depot://bucket/manifest")
    );
    let counts = inventory.staged_counts.unwrap();
    assert_eq!(counts.plan, 1);
    assert_eq!(counts.supporting, 0);
}

#[tokio::test]
async fn test_global_ledger_enabled_path() {
    let app = Router::new().route(
        "/receipts/search",
        get(|| async { Json(json!({"receipts": [receipt_header("r-1", "complete")]})) }),
    );
    let base = spawn_stub(app).await;

    let gate = GlobalLedgerGate::new(true, Some(base.clone()));
    let headers = gate.query_receipt_headers("acme", "root-1").await.unwrap();
    assert_eq!(headers.len(), 1);

    // The same reachable endpoint is still denied when the opt-in is off
    let disabled = GlobalLedgerGate::new(false, Some(base));
    let result = disabled.query_receipt_headers("acme", "root-1").await;
    assert!(matches!(result, Err(SourceError::GlobalLedgerDisabled)));
}
