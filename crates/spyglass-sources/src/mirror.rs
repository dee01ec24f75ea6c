//! Ledger mirror client
//!
//! Bounded reqwest client against a read-replica receipt store. Signals
//! `Unavailable` when the endpoint is unreachable, times out, answers with
//! a non-success status, returns a malformed payload, or is not configured;
//! a missing receipt is `Ok(None)`, not an error. Retry and fallback are
//! the orchestrator's responsibility, never this client's.

use crate::error::SourceError;
use crate::readonly;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use spyglass_domain::{FullReceipt, ReceiptHeader, Source};
use std::time::Duration;
use tracing::debug;

/// Default timeout for mirror queries (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the read-replica receipt store.
pub struct LedgerMirrorClient {
    endpoint: Option<String>,
    client: reqwest::Client,
}

/// Wire shape of the mirror's search response
#[derive(Deserialize)]
struct ReceiptSearchPayload {
    #[serde(default)]
    receipts: Vec<ReceiptHeader>,
}

impl LedgerMirrorClient {
    /// Capability tag for response attribution
    pub const SOURCE: Source = Source::LedgerMirror;

    /// Create a mirror client. `endpoint` is the mirror base URL; `None`
    /// leaves the client permanently unavailable.
    pub fn new(endpoint: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self { endpoint, client }
    }

    fn endpoint(&self) -> Result<&str, SourceError> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("ledger mirror endpoint not configured".to_string()))
    }

    /// Query receipt headers for a lineage, bounded by `since` and `limit`.
    pub async fn query_receipt_headers(
        &self,
        tenant_id: &str,
        root_task_id: &str,
        phase: Option<&str>,
        recipient_ai: Option<&str>,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ReceiptHeader>, SourceError> {
        readonly::assert_read_only("receipts/search")?;
        let endpoint = self.endpoint()?;

        let mut params: Vec<(&str, String)> = vec![
            ("tenant_id", tenant_id.to_string()),
            ("root_task_id", root_task_id.to_string()),
            ("since", since.to_rfc3339()),
            ("limit", limit.to_string()),
        ];
        if let Some(phase) = phase {
            params.push(("phase", phase.to_string()));
        }
        if let Some(recipient) = recipient_ai {
            params.push(("recipient_ai", recipient.to_string()));
        }

        debug!(tenant_id, root_task_id, limit, "querying ledger mirror");

        let response = self
            .client
            .get(format!("{}/receipts/search", endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("ledger mirror query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "ledger mirror returned HTTP {}",
                response.status()
            )));
        }

        let payload: ReceiptSearchPayload = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("ledger mirror returned malformed payload: {}", e))
        })?;

        Ok(payload.receipts)
    }

    /// Fetch a single receipt by id. HTTP 404 means the receipt does not
    /// exist and yields `Ok(None)`.
    pub async fn get_receipt(
        &self,
        tenant_id: &str,
        receipt_id: &str,
    ) -> Result<Option<FullReceipt>, SourceError> {
        readonly::assert_read_only("receipts/get")?;
        let endpoint = self.endpoint()?;

        let response = self
            .client
            .get(format!("{}/receipts/{}", endpoint, receipt_id))
            .query(&[("tenant_id", tenant_id)])
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("ledger mirror get failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "ledger mirror returned HTTP {}",
                response.status()
            )));
        }

        let receipt: FullReceipt = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("ledger mirror returned malformed payload: {}", e))
        })?;

        Ok(Some(receipt))
    }
}
