//! Integration tests for the source manager against stub downstreams
//!
//! Each test stands up throwaway axum services on 127.0.0.1:0 for the
//! sources it needs, then drives the real orchestrator end to end.

use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use spyglass_domain::{RequestControls, Source, TaskState};
use spyglass_engine::{EngineConfig, QueryError, SearchReceiptsRequest, SourceManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn receipt_header(id: &str, phase: &str, created_at: &str) -> Value {
    json!({
        "receipt_id": id,
        "phase": phase,
        "task_id": format!("task-{}", id),
        "root_task_id": "root-1",
        "tenant_id": "acme",
        "created_at": created_at
    })
}

/// Mirror stub with one lineage: an accepted receipt and a completed
/// shipment receipt.
fn shipment_mirror() -> Router {
    Router::new()
        .route(
            "/receipts/search",
            get(|| async {
                Json(json!({
                    "receipts": [
                        receipt_header("r-1", "accepted", "2026-03-10T08:00:00Z"),
                        receipt_header("r-2", "complete", "2026-03-10T09:00:00Z"),
                    ]
                }))
            }),
        )
        .route(
            "/receipts/:id",
            get(|Path(id): Path<String>| async move {
                if id == "r-2" {
                    Json(json!({
                        "receipt_id": "r-2",
                        "tenant_id": "acme",
                        "task_id": "task-r-2",
                        "root_task_id": "root-1",
                        "phase": "complete",
                        "task_type": "shipment_manifest",
                        "artifact_pointer": "depot://bucket/manifest-1"
                    }))
                    .into_response()
                } else {
                    axum::http::StatusCode::NOT_FOUND.into_response()
                }
            }),
        )
}

fn config_with_mirror(base: String) -> EngineConfig {
    EngineConfig {
        mirror_url: Some(base),
        ..EngineConfig::default_test_config()
    }
}

#[tokio::test]
async fn test_status_derived_from_mirror_and_cached() {
    let base = spawn_stub(shipment_mirror()).await;
    let manager = SourceManager::new(config_with_mirror(base));

    let (status, metadata) = manager.get_status("acme", "root-1").await.unwrap();
    assert_eq!(status.state, TaskState::Shipped);
    assert_eq!(status.shipment_status.as_deref(), Some("shipped"));
    assert_eq!(
        status.shipment_manifest_pointer.as_deref(),
        Some("depot://bucket/manifest-1")
    );
    assert_eq!(status.latest_receipt_id.as_deref(), Some("r-2"));
    assert_eq!(metadata.source, Source::LedgerMirror);

    // Recomputed status was written back; the second read is a cache hit
    let (cached, metadata) = manager.get_status("acme", "root-1").await.unwrap();
    assert_eq!(cached.state, TaskState::Shipped);
    assert_eq!(metadata.source, Source::ProjectionCache);
    assert_eq!(metadata.cost_units, 1);
}

#[tokio::test]
async fn test_search_attributes_mirror_and_never_writes_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_handle = hits.clone();
    let app = Router::new().route(
        "/receipts/search",
        get(move || {
            let hits = hits_handle.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "receipts": [receipt_header("r-1", "accepted", "2026-03-10T08:00:00Z")]
                }))
            }
        }),
    );
    let base = spawn_stub(app).await;
    let manager = SourceManager::new(config_with_mirror(base));

    let request = SearchReceiptsRequest {
        tenant_id: "acme".to_string(),
        root_task_id: "root-1".to_string(),
        phase: None,
        recipient_ai: None,
        controls: RequestControls::default(),
    };

    let (headers, metadata) = manager.search_receipts(&request).await.unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(metadata.source, Source::LedgerMirror);
    assert_eq!(metadata.freshness_age_ms, 0);

    // cache_ok with an empty cache again: the mirror answers again, which
    // proves the first search left no cache entry behind
    let (_, metadata) = manager.search_receipts(&request).await.unwrap();
    assert_eq!(metadata.source, Source::LedgerMirror);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(manager.cache().header_entry_count(), 0);
}

#[tokio::test]
async fn test_search_clamps_requested_limit() {
    let seen_limit = Arc::new(std::sync::Mutex::new(None::<String>));
    let seen_handle = seen_limit.clone();
    let app = Router::new().route(
        "/receipts/search",
        get(
            move |axum::extract::Query(params): axum::extract::Query<
                std::collections::HashMap<String, String>,
            >| {
                let seen = seen_handle.clone();
                async move {
                    *seen.lock().unwrap() = params.get("limit").cloned();
                    Json(json!({"receipts": []}))
                }
            },
        ),
    );
    let base = spawn_stub(app).await;
    let manager = SourceManager::new(config_with_mirror(base));

    let request = SearchReceiptsRequest {
        tenant_id: "acme".to_string(),
        root_task_id: "root-1".to_string(),
        phase: None,
        recipient_ai: None,
        controls: RequestControls {
            limit: Some(9999),
            ..Default::default()
        },
    };

    let (headers, _) = manager.search_receipts(&request).await.unwrap();
    assert!(headers.is_empty());
    // 9999 must arrive at the mirror clamped to the configured maximum
    assert_eq!(seen_limit.lock().unwrap().as_deref(), Some("200"));
}

#[tokio::test]
async fn test_get_receipt_writes_back_to_cache() {
    let base = spawn_stub(shipment_mirror()).await;
    let manager = SourceManager::new(config_with_mirror(base));

    let (receipt, metadata) = manager.get_receipt("acme", "r-2").await.unwrap();
    assert!(receipt.is_some());
    assert_eq!(metadata.source, Source::LedgerMirror);
    assert_eq!(metadata.cost_units, 2);

    let (receipt, metadata) = manager.get_receipt("acme", "r-2").await.unwrap();
    assert_eq!(receipt.unwrap().receipt_id, "r-2");
    assert_eq!(metadata.source, Source::ProjectionCache);
    assert_eq!(metadata.cost_units, 1);
}

#[tokio::test]
async fn test_get_receipt_absent_is_not_found_not_error() {
    let base = spawn_stub(shipment_mirror()).await;
    let manager = SourceManager::new(config_with_mirror(base));

    let (receipt, metadata) = manager.get_receipt("acme", "r-unknown").await.unwrap();
    assert!(receipt.is_none());
    assert_eq!(metadata.source, Source::LedgerMirror);
}

#[tokio::test]
async fn test_health_live_and_rate_limit_surfaced() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            Json(json!({
                "component_id": "taskgate",
                "version": "1.9.0",
                "uptime_seconds": 3600,
                "error_budget_status": "healthy",
                "metrics": {"queued_count": 12, "leased_count": 3}
            }))
        }),
    );
    let base = spawn_stub(app).await;

    let config = EngineConfig {
        component_url: Some(base),
        component_id: "taskgate".to_string(),
        component_poll_rate_limit_per_minute: 1,
        ..EngineConfig::default_test_config()
    };
    let manager = SourceManager::new(config);

    let (report, metadata) = manager.poll_health("acme", true).await.unwrap();
    assert!(report.reachable);
    assert_eq!(report.component_id, "taskgate");
    assert_eq!(report.version.as_deref(), Some("1.9.0"));
    assert_eq!(report.metrics_snapshot.unwrap().queued_count, 12);
    assert_eq!(metadata.source, Source::ComponentPoll);
    assert_eq!(metadata.cost_units, 5);

    // Same shape again: served from the poll cache, no budget spent
    let (report, _) = manager.poll_health("acme", true).await.unwrap();
    assert!(report.reachable);

    // Different shape: cache miss, budget exhausted, surfaced to the caller
    let result = manager.poll_health("acme", false).await;
    assert!(matches!(result, Err(QueryError::RateLimited(_))));
}

#[tokio::test]
async fn test_non_verbose_health_drops_metrics() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            Json(json!({
                "component_id": "gate",
                "metrics": {"queued_count": 4}
            }))
        }),
    );
    let base = spawn_stub(app).await;
    let manager = SourceManager::new(EngineConfig {
        component_url: Some(base),
        ..EngineConfig::default_test_config()
    });

    let (report, _) = manager.poll_health("acme", false).await.unwrap();
    assert!(report.reachable);
    assert!(report.metrics_snapshot.is_none());
}

#[tokio::test]
async fn test_queue_report_bounds_items() {
    let app = Router::new().route(
        "/queues/diagnostics",
        get(|| async {
            let items: Vec<Value> = (0..60)
                .map(|i| {
                    json!({
                        "task_id": format!("t-{}", i),
                        "task_type": "render",
                        "status": "queued"
                    })
                })
                .collect();
            Json(json!({
                "queue_depth": 60,
                "oldest_item_age_ms": 12_000,
                "active_leases_count": 5,
                "items": items
            }))
        }),
    );
    let base = spawn_stub(app).await;
    let manager = SourceManager::new(EngineConfig {
        component_url: Some(base),
        ..EngineConfig::default_test_config()
    });

    // Requested 9999, capped to 50
    let (report, metadata) = manager
        .poll_queue("acme", Some("q-main"), Some(9999), true)
        .await
        .unwrap();
    assert_eq!(report.queue_depth, 60);
    assert_eq!(report.items.len(), 50);
    assert!(metadata.truncated);
}

#[tokio::test]
async fn test_artifact_inventory_end_to_end() {
    let app = Router::new().route(
        "/artifacts/metadata",
        get(|| async {
            Json(json!({
                "artifacts": [{
                    "artifact_id": "a-1",
                    "root_task_id": "root-1",
                    "mime_type": "text/markdown",
                    "size_bytes": 512,
                    "artifact_role": "plan"
                }],
                "staged_counts": {"plan": 1}
            }))
        }),
    );
    let base = spawn_stub(app).await;
    let manager = SourceManager::new(EngineConfig {
        depot_url: Some(base),
        ..EngineConfig::default_test_config()
    });

    let (inventory, metadata) = manager
        .list_artifacts("acme", Some("root-1"), None, &RequestControls::default())
        .await
        .unwrap();

    assert_eq!(inventory.artifact_pointers.len(), 1);
    assert_eq!(inventory.staged_counts.unwrap().plan, 1);
    assert_eq!(metadata.source, Source::StorageMetadata);
}

#[tokio::test]
async fn test_global_ledger_gate_policy_beats_reachability() {
    let app = Router::new().route(
        "/receipts/search",
        get(|| async {
            Json(json!({"receipts": [receipt_header("r-1", "complete", "2026-03-10T08:00:00Z")]}))
        }),
    );
    let base = spawn_stub(app).await;

    // Reachable endpoint, opt-in off: policy denial, not an outage
    let manager = SourceManager::new(EngineConfig {
        global_ledger_url: Some(base.clone()),
        allow_global_ledger: false,
        ..EngineConfig::default_test_config()
    });
    let result = manager.query_global_ledger("acme", "root-1").await;
    assert!(matches!(result, Err(QueryError::GlobalLedgerDisabled)));

    // Opt-in on: the query proceeds at full cost
    let manager = SourceManager::new(EngineConfig {
        global_ledger_url: Some(base),
        allow_global_ledger: true,
        ..EngineConfig::default_test_config()
    });
    let (headers, metadata) = manager.query_global_ledger("acme", "root-1").await.unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(metadata.source, Source::GlobalLedger);
    assert_eq!(metadata.cost_units, 100);
}
