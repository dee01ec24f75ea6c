//! HTTP request handlers for the Spyglass server.
//!
//! Implements the /v1 read operations and the liveness endpoint using axum.
//! Every /v1 handler authenticates, calls the shared source manager, and
//! returns `(payload, metadata)` as JSON; engine errors map onto status
//! codes (validation 400, rate limit 429, ledger policy 403, outage 503).

use crate::auth::{self, AuthError};
use crate::config::ServerConfig;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use spyglass_domain::{
    ArtifactInventory, FullReceipt, HealthReport, QueueReport, ReceiptHeader, RequestControls,
    ResponseMetadata, StatusSummary,
};
use spyglass_engine::{QueryError, SearchReceiptsRequest, SourceManager};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The process-wide source manager
    pub manager: Arc<SourceManager>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Authentication failure
    Auth(AuthError),
    /// Engine error
    Query(QueryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(AuthError::NotConfigured) => {
                (StatusCode::SERVICE_UNAVAILABLE, AuthError::NotConfigured.to_string())
            }
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            AppError::Query(QueryError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Query(e @ QueryError::RateLimited(_)) => {
                (StatusCode::TOO_MANY_REQUESTS, e.to_string())
            }
            AppError::Query(e @ QueryError::GlobalLedgerDisabled) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            AppError::Query(e @ QueryError::SourceUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::Query(e)
    }
}

/// Liveness response
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    /// Overall status
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Instance identifier
    pub instance_id: String,
}

/// GET /health - liveness and service info
async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy".to_string(),
        service: "spyglass".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.config.instance_id.clone(),
    })
}

/// Request for the status operation
#[derive(Debug, Deserialize)]
pub struct StatusReceiptsRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Task ID (alias for the root when no root is given)
    #[serde(default)]
    pub task_id: Option<String>,
    /// Root task ID of the lineage
    #[serde(default)]
    pub root_task_id: Option<String>,
}

/// Response for the status operation
#[derive(Debug, Serialize)]
pub struct StatusReceiptsResponse {
    /// Derived lineage status
    pub status: StatusSummary,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/status/receipts - derived status for a task lineage
async fn status_receipts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StatusReceiptsRequest>,
) -> Result<Json<StatusReceiptsResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let root_task_id = request
        .root_task_id
        .or(request.task_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            QueryError::Validation("either task_id or root_task_id is required".to_string())
        })?;

    let (status, metadata) = state.manager.get_status(&request.tenant_id, &root_task_id).await?;

    Ok(Json(StatusReceiptsResponse { status, metadata }))
}

/// Response for the search operation
#[derive(Debug, Serialize)]
pub struct SearchReceiptsResponse {
    /// Matching receipt headers, most recent first
    pub receipts: Vec<ReceiptHeader>,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/search/receipts - receipt headers with strict bounds
async fn search_receipts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SearchReceiptsRequest>,
) -> Result<Json<SearchReceiptsResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (receipts, metadata) = state.manager.search_receipts(&request).await?;

    Ok(Json(SearchReceiptsResponse { receipts, metadata }))
}

/// Request for the get-receipt operation
#[derive(Debug, Deserialize)]
pub struct GetReceiptRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Receipt identifier
    pub receipt_id: String,
}

/// Response for the get-receipt operation
#[derive(Debug, Serialize)]
pub struct GetReceiptResponse {
    /// The receipt, when found
    pub receipt: Option<FullReceipt>,
    /// Whether the receipt was found in any consulted source
    pub found: bool,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/get/receipt - a single receipt by id
async fn get_receipt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GetReceiptRequest>,
) -> Result<Json<GetReceiptResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (receipt, metadata) = state
        .manager
        .get_receipt(&request.tenant_id, &request.receipt_id)
        .await?;

    Ok(Json(GetReceiptResponse {
        found: receipt.is_some(),
        receipt,
        metadata,
    }))
}

/// Request for the component-health operation
#[derive(Debug, Deserialize)]
pub struct ComponentHealthRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Include verbose metrics
    #[serde(default)]
    pub verbose: bool,
}

/// Response for the component-health operation
#[derive(Debug, Serialize)]
pub struct ComponentHealthResponse {
    /// Health observation
    #[serde(flatten)]
    pub report: HealthReport,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/health/component - live component health snapshot
async fn component_health(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ComponentHealthRequest>,
) -> Result<Json<ComponentHealthResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (report, metadata) = state
        .manager
        .poll_health(&request.tenant_id, request.verbose)
        .await?;

    Ok(Json(ComponentHealthResponse { report, metadata }))
}

/// Request for the queue-diagnostics operation
#[derive(Debug, Deserialize)]
pub struct QueueDiagnosticsRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Specific queue to inspect
    #[serde(default)]
    pub queue_id: Option<String>,
    /// Maximum item headers to return (hard-capped at 50)
    #[serde(default)]
    pub limit: Option<u32>,
    /// Include example item headers
    #[serde(default)]
    pub include_examples: bool,
}

/// Response for the queue-diagnostics operation
#[derive(Debug, Serialize)]
pub struct QueueDiagnosticsResponse {
    /// Queue observation
    #[serde(flatten)]
    pub report: QueueReport,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/queue/component - live queue diagnostics
async fn queue_diagnostics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueueDiagnosticsRequest>,
) -> Result<Json<QueueDiagnosticsResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (report, metadata) = state
        .manager
        .poll_queue(
            &request.tenant_id,
            request.queue_id.as_deref(),
            request.limit,
            request.include_examples,
        )
        .await?;

    Ok(Json(QueueDiagnosticsResponse { report, metadata }))
}

/// Request for the artifact-inventory operation
#[derive(Debug, Deserialize)]
pub struct ArtifactInventoryRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Lineage to inventory
    #[serde(default)]
    pub root_task_id: Option<String>,
    /// Deliverable to inventory
    #[serde(default)]
    pub deliverable_id: Option<String>,
    /// Caller-requested bounds
    #[serde(default)]
    pub controls: RequestControls,
}

/// Response for the artifact-inventory operation
#[derive(Debug, Serialize)]
pub struct ArtifactInventoryResponse {
    /// Pointers, manifest pointer, and staged counts
    #[serde(flatten)]
    pub inventory: ArtifactInventory,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/inventory/artifacts - staged artifact pointers
async fn artifact_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ArtifactInventoryRequest>,
) -> Result<Json<ArtifactInventoryResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (inventory, metadata) = state
        .manager
        .list_artifacts(
            &request.tenant_id,
            request.root_task_id.as_deref(),
            request.deliverable_id.as_deref(),
            &request.controls,
        )
        .await?;

    Ok(Json(ArtifactInventoryResponse { inventory, metadata }))
}

/// Request for the global-ledger operation
#[derive(Debug, Deserialize)]
pub struct GlobalLedgerRequest {
    /// Tenant identifier
    pub tenant_id: String,
    /// Lineage to query
    pub root_task_id: String,
}

/// Response for the global-ledger operation
#[derive(Debug, Serialize)]
pub struct GlobalLedgerResponse {
    /// Receipt headers from the authoritative ledger
    pub receipts: Vec<ReceiptHeader>,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// POST /v1/global-ledger/receipts - gated authoritative ledger query
async fn global_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GlobalLedgerRequest>,
) -> Result<Json<GlobalLedgerResponse>, AppError> {
    auth::verify_api_key(&state.config, &headers)?;

    let (receipts, metadata) = state
        .manager
        .query_global_ledger(&request.tenant_id, &request.root_task_id)
        .await?;

    Ok(Json(GlobalLedgerResponse { receipts, metadata }))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(service_info))
        .route("/v1/status/receipts", post(status_receipts))
        .route("/v1/search/receipts", post(search_receipts))
        .route("/v1/get/receipt", post(get_receipt))
        .route("/v1/health/component", post(component_health))
        .route("/v1/queue/component", post(queue_diagnostics))
        .route("/v1/inventory/artifacts", post(artifact_inventory))
        .route("/v1/global-ledger/receipts", post(global_ledger))
        .with_state(state)
}
