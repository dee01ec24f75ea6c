//! Storage metadata client
//!
//! Queries the artifact-pointer index for a lineage or deliverable.
//! Returns pointers, an optional shipment-manifest pointer, and per-role
//! staged counts. Never dereferences a pointer's location or content hash
//! into blob bytes. Identifier presence is validated by the caller.

use crate::error::SourceError;
use crate::readonly;
use serde::Deserialize;
use spyglass_domain::{ArtifactInventory, ArtifactPointer, Source, StagedCounts};
use std::time::Duration;
use tracing::debug;

/// Default timeout for metadata queries (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the artifact-pointer index.
pub struct StorageMetadataClient {
    endpoint: Option<String>,
    client: reqwest::Client,
}

/// Wire shape of the index's metadata response
#[derive(Deserialize)]
struct ArtifactMetadataPayload {
    #[serde(default)]
    artifacts: Vec<ArtifactPointer>,
    shipment_manifest_pointer: Option<String>,
    staged_counts: Option<StagedCounts>,
}

impl StorageMetadataClient {
    /// Capability tag for response attribution
    pub const SOURCE: Source = Source::StorageMetadata;

    /// Create a metadata client. `None` leaves it permanently unavailable.
    pub fn new(endpoint: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self { endpoint, client }
    }

    /// List artifact pointers for a lineage or deliverable.
    pub async fn list_artifacts(
        &self,
        tenant_id: &str,
        root_task_id: Option<&str>,
        deliverable_id: Option<&str>,
        limit: u32,
    ) -> Result<ArtifactInventory, SourceError> {
        readonly::assert_read_only("artifacts/metadata")?;

        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            SourceError::Unavailable("storage metadata endpoint not configured".to_string())
        })?;

        let mut params: Vec<(&str, String)> = vec![
            ("tenant_id", tenant_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(root_task_id) = root_task_id {
            params.push(("root_task_id", root_task_id.to_string()));
        }
        if let Some(deliverable_id) = deliverable_id {
            params.push(("deliverable_id", deliverable_id.to_string()));
        }

        debug!(tenant_id, limit, "querying storage metadata index");

        let response = self
            .client
            .get(format!("{}/artifacts/metadata", endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("storage metadata query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "storage metadata index returned HTTP {}",
                response.status()
            )));
        }

        let payload: ArtifactMetadataPayload = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("storage metadata returned malformed payload: {}", e))
        })?;

        Ok(ArtifactInventory {
            artifact_pointers: payload.artifacts,
            shipment_manifest_pointer: payload.shipment_manifest_pointer,
            staged_counts: payload.staged_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_endpoint_is_unavailable() {
        let client = StorageMetadataClient::new(None);
        let result = client.list_artifacts("acme", Some("root-1"), None, 100).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
