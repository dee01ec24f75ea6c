//! Health tool - live component health snapshot

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{HealthReport, ResponseMetadata};
use spyglass_engine::SourceManager;

/// Parameters for the component-health tool
#[derive(Debug, Deserialize)]
pub struct ComponentHealthParams {
    /// Tenant identifier
    pub tenant_id: String,
    /// Include verbose metrics
    #[serde(default)]
    pub verbose: bool,
}

/// Result of the component-health tool
#[derive(Debug, Serialize)]
pub struct ComponentHealthResult {
    /// Health observation
    #[serde(flatten)]
    pub report: HealthReport,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_component_health tool invocation
///
/// A component outage yields `reachable = false`, not an error; a
/// rate-limit rejection surfaces as an error.
pub async fn handle_component_health(
    manager: &SourceManager,
    params: ComponentHealthParams,
) -> Result<ComponentHealthResult, McpError> {
    let (report, metadata) = manager.poll_health(&params.tenant_id, params.verbose).await?;

    Ok(ComponentHealthResult { report, metadata })
}
