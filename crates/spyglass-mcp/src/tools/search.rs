//! Search tool - receipt headers for a lineage, strictly bounded

use crate::error::McpError;
use serde::Serialize;
use spyglass_domain::{ReceiptHeader, ResponseMetadata};
use spyglass_engine::{SearchReceiptsRequest, SourceManager};

/// Result of the search tool
#[derive(Debug, Serialize)]
pub struct SearchReceiptsResult {
    /// Matching receipt headers, most recent first
    pub receipts: Vec<ReceiptHeader>,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_search_receipts tool invocation
///
/// Parameters deserialize directly into the engine's
/// [`SearchReceiptsRequest`]; bounds are clamped by the engine, never here.
pub async fn handle_search_receipts(
    manager: &SourceManager,
    params: SearchReceiptsRequest,
) -> Result<SearchReceiptsResult, McpError> {
    let (receipts, metadata) = manager.search_receipts(&params).await?;

    Ok(SearchReceiptsResult { receipts, metadata })
}

#[cfg(test)]
mod tests {
    use spyglass_domain::Freshness;
    use spyglass_engine::SearchReceiptsRequest;

    #[test]
    fn test_request_deserializes_with_controls() {
        let json = r#"{
            "tenant_id": "acme",
            "root_task_id": "root-1",
            "phase": "complete",
            "controls": {"limit": 25, "freshness": "prefer_fresh"}
        }"#;

        let request: SearchReceiptsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.phase.as_deref(), Some("complete"));
        assert_eq!(request.controls.limit, Some(25));
        assert_eq!(request.controls.freshness, Freshness::PreferFresh);
    }

    #[test]
    fn test_request_defaults() {
        let json = r#"{"tenant_id": "acme", "root_task_id": "root-1"}"#;
        let request: SearchReceiptsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.controls.freshness, Freshness::CacheOk);
        assert_eq!(request.controls.limit, None);
    }
}
