//! Global ledger tool - gated query against the authoritative ledger

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{ReceiptHeader, ResponseMetadata};
use spyglass_engine::SourceManager;

/// Parameters for the global-ledger tool
#[derive(Debug, Deserialize)]
pub struct GlobalLedgerParams {
    /// Tenant identifier
    pub tenant_id: String,
    /// Lineage to query
    pub root_task_id: String,
}

/// Result of the global-ledger tool
#[derive(Debug, Serialize)]
pub struct GlobalLedgerResult {
    /// Receipt headers from the authoritative ledger
    pub receipts: Vec<ReceiptHeader>,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_global_ledger tool invocation
///
/// Denied with a distinct policy error unless the operator opt-in is set.
pub async fn handle_global_ledger(
    manager: &SourceManager,
    params: GlobalLedgerParams,
) -> Result<GlobalLedgerResult, McpError> {
    let (receipts, metadata) = manager
        .query_global_ledger(&params.tenant_id, &params.root_task_id)
        .await?;

    Ok(GlobalLedgerResult { receipts, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_require_both_identifiers() {
        let result: Result<GlobalLedgerParams, _> =
            serde_json::from_str(r#"{"tenant_id": "acme"}"#);
        assert!(result.is_err());
    }
}
