//! Get tool - a single receipt by id

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use spyglass_domain::{FullReceipt, ResponseMetadata};
use spyglass_engine::SourceManager;

/// Parameters for the get-receipt tool
#[derive(Debug, Deserialize)]
pub struct GetReceiptParams {
    /// Tenant identifier
    pub tenant_id: String,
    /// Receipt identifier
    pub receipt_id: String,
}

/// Result of the get-receipt tool
#[derive(Debug, Serialize)]
pub struct GetReceiptResult {
    /// The receipt, when found
    pub receipt: Option<FullReceipt>,
    /// Whether the receipt was found in any consulted source
    pub found: bool,
    /// Response attribution
    pub metadata: ResponseMetadata,
}

/// Handle spyglass_get_receipt tool invocation
pub async fn handle_get_receipt(
    manager: &SourceManager,
    params: GetReceiptParams,
) -> Result<GetReceiptResult, McpError> {
    let (receipt, metadata) = manager
        .get_receipt(&params.tenant_id, &params.receipt_id)
        .await?;

    Ok(GetReceiptResult {
        found: receipt.is_some(),
        receipt,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize() {
        let params: GetReceiptParams =
            serde_json::from_str(r#"{"tenant_id": "acme", "receipt_id": "r-1"}"#).unwrap();
        assert_eq!(params.receipt_id, "r-1");
    }
}
