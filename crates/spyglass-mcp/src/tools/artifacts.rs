//! Artifacts tool - staged artifact pointers for a lineage or deliverable

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{ArtifactInventory, RequestControls, ResponseMetadata};
use spyglass_engine::SourceManager;

/// Parameters for the artifact-inventory tool
#[derive(Debug, Deserialize)]
pub struct ArtifactInventoryParams {
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

/// Result of the artifact-inventory tool
#[derive(Debug, Serialize)]
pub struct ArtifactInventoryResult {
    /// Pointers, manifest pointer, and staged counts
    #[serde(flatten)]
    pub inventory: ArtifactInventory,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_artifact_inventory tool invocation
pub async fn handle_artifact_inventory(
    manager: &SourceManager,
    params: ArtifactInventoryParams,
) -> Result<ArtifactInventoryResult, McpError> {
    let (inventory, metadata) = manager
        .list_artifacts(
            &params.tenant_id,
            params.root_task_id.as_deref(),
            params.deliverable_id.as_deref(),
            &params.controls,
        )
        .await?;

    Ok(ArtifactInventoryResult { inventory, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_allow_either_identifier() {
        let by_lineage: ArtifactInventoryParams =
            serde_json::from_str(r#"{"tenant_id": "acme", "root_task_id": "root-1"}"#).unwrap();
        assert_eq!(by_lineage.root_task_id.as_deref(), Some("root-1"));

        let by_deliverable: ArtifactInventoryParams =
            serde_json::from_str(r#"{"tenant_id": "acme", "deliverable_id": "d-1"}"#).unwrap();
        assert_eq!(by_deliverable.deliverable_id.as_deref(), Some("d-1"));
    }
}
