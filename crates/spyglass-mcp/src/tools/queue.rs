//! Queue tool - live component queue diagnostics

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{QueueReport, ResponseMetadata};
use spyglass_engine::SourceManager;

/// Parameters for the queue-diagnostics tool
#[derive(Debug, Deserialize)]
pub struct QueueDiagnosticsParams {
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

/// Result of the queue-diagnostics tool
#[derive(Debug, Serialize)]
pub struct QueueDiagnosticsResult {
    /// Queue observation
    #[serde(flatten)]
    pub report: QueueReport,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_queue_diagnostics tool invocation
pub async fn handle_queue_diagnostics(
    manager: &SourceManager,
    params: QueueDiagnosticsParams,
) -> Result<QueueDiagnosticsResult, McpError> {
    let (report, metadata) = manager
        .poll_queue(
            &params.tenant_id,
            params.queue_id.as_deref(),
            params.limit,
            params.include_examples,
        )
        .await?;

    Ok(QueueDiagnosticsResult { report, metadata })
}
