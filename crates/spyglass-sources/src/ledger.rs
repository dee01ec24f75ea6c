//! Global ledger gate
//!
//! Last-resort client to the authoritative receipt ledger, disabled by
//! default. The policy gate is checked before every call: when disabled,
//! the denial is a distinct policy signal regardless of transport health,
//! never conflated with an outage. When enabled, the call proceeds only if
//! an endpoint is configured.

use crate::error::SourceError;
use crate::readonly;
use serde::Deserialize;
use spyglass_domain::{ReceiptHeader, Source};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for global ledger queries (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gated client for the authoritative global ledger.
pub struct GlobalLedgerGate {
    enabled: bool,
    endpoint: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ReceiptSearchPayload {
    #[serde(default)]
    receipts: Vec<ReceiptHeader>,
}

impl GlobalLedgerGate {
    /// Capability tag for response attribution
    pub const SOURCE: Source = Source::GlobalLedger;

    /// Create the gate. `enabled` is the explicit operator opt-in.
    pub fn new(enabled: bool, endpoint: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self {
            enabled,
            endpoint,
            client,
        }
    }

    /// Whether the operator opt-in is set.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn check_access(&self) -> Result<&str, SourceError> {
        if !self.enabled {
            return Err(SourceError::GlobalLedgerDisabled);
        }
        self.endpoint
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("global ledger endpoint not configured".to_string()))
    }

    /// Query receipts for a lineage from the authoritative ledger.
    /// Unfiltered by default beyond tenant and lineage scoping.
    pub async fn query_receipt_headers(
        &self,
        tenant_id: &str,
        root_task_id: &str,
    ) -> Result<Vec<ReceiptHeader>, SourceError> {
        readonly::assert_read_only("receipts/search")?;
        let endpoint = self.check_access()?;

        warn!(tenant_id, root_task_id, "querying authoritative global ledger");

        let response = self
            .client
            .get(format!("{}/receipts/search", endpoint))
            .query(&[("tenant_id", tenant_id), ("root_task_id", root_task_id)])
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("global ledger query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "global ledger returned HTTP {}",
                response.status()
            )));
        }

        let payload: ReceiptSearchPayload = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("global ledger returned malformed payload: {}", e))
        })?;

        debug!(count = payload.receipts.len(), "global ledger answered");
        Ok(payload.receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_gate_denies_before_transport() {
        // Endpoint configured and syntactically valid; policy still wins
        let gate = GlobalLedgerGate::new(false, Some("http://127.0.0.1:9".to_string()));
        let result = gate.query_receipt_headers("acme", "root-1").await;

        assert!(matches!(result, Err(SourceError::GlobalLedgerDisabled)));
    }

    #[tokio::test]
    async fn test_enabled_without_endpoint_is_unavailable() {
        let gate = GlobalLedgerGate::new(true, None);
        let result = gate.query_receipt_headers("acme", "root-1").await;

        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
