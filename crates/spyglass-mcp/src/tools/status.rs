//! Status tool - derived status for a task lineage

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{ResponseMetadata, StatusSummary};
use spyglass_engine::SourceManager;

/// Parameters for the status tool
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    /// Tenant identifier
    pub tenant_id: String,
    /// Task ID (stands in for the root when no root is given)
    #[serde(default)]
    pub task_id: Option<String>,
    /// Root task ID of the lineage
    #[serde(default)]
    pub root_task_id: Option<String>,
}

/// Result of the status tool
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// Derived lineage status
    pub status: StatusSummary,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_status tool invocation
pub async fn handle_status(
    manager: &SourceManager,
    params: StatusParams,
) -> Result<StatusResult, McpError> {
    let root_task_id = params
        .root_task_id
        .or(params.task_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            McpError::InvalidRequest("either task_id or root_task_id is required".to_string())
        })?;

    let (status, metadata) = manager.get_status(&params.tenant_id, &root_task_id).await?;

    Ok(StatusResult { status, metadata })
}
