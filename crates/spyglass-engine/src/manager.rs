//! Source manager: the per-operation fallback orchestrator
//!
//! Owns one instance of every backing-source client and implements the
//! fallback policy for each public read operation. Every operation returns
//! its payload together with [`ResponseMetadata`] whose `source` and
//! `cost_units` reflect the source that actually produced the data, not
//! every source attempted.

use crate::bounds;
use crate::config::EngineConfig;
use crate::derive::{self, MAX_SHIPMENT_PROBES};
use crate::error::QueryError;
use chrono::Utc;
use serde::Deserialize;
use spyglass_domain::receipt::phase;
use spyglass_domain::{
    ArtifactInventory, FullReceipt, HealthReport, QueueReport, ReceiptHeader, RequestControls,
    ResponseMetadata, Source, StatusSummary,
};
use spyglass_sources::{
    ComponentPoller, GlobalLedgerGate, LedgerMirrorClient, ProjectionCache, SourceError,
    StorageMetadataClient,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Queue item headers returned when the caller does not request a limit
pub const DEFAULT_QUEUE_LIMIT: u32 = 20;

/// Hard cap on queue item headers, regardless of caller request
pub const MAX_QUEUE_LIMIT: u32 = 50;

/// Sliding window over which component polls are budgeted
const POLL_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Parameters for the receipt search operation.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchReceiptsRequest {
    /// Owning tenant
    pub tenant_id: String,
    /// Lineage to search
    pub root_task_id: String,
    /// Filter by receipt phase
    #[serde(default)]
    pub phase: Option<String>,
    /// Filter by recipient
    #[serde(default)]
    pub recipient_ai: Option<String>,
    /// Caller-requested bounds
    #[serde(default)]
    pub controls: RequestControls,
}

/// Orchestrator over the backing sources.
///
/// Construct one per process and inject it into every request-handling
/// path; all operations take `&self` and internal state is lock-protected.
pub struct SourceManager {
    config: EngineConfig,
    cache: ProjectionCache,
    mirror: LedgerMirrorClient,
    poller: ComponentPoller,
    depot: StorageMetadataClient,
    ledger: GlobalLedgerGate,
}

/// Cost of a mirror or storage query: base weight plus per-row work.
fn query_cost(source: Source, rows: usize) -> u32 {
    source.base_cost() + (rows as u32) / 10
}

impl SourceManager {
    /// Build the manager and all source clients from configuration.
    pub fn new(config: EngineConfig) -> Self {
        let cache = ProjectionCache::new(Duration::from_secs(config.projection_cache_ttl_seconds));
        let mirror = LedgerMirrorClient::new(config.mirror_url.clone());
        let poller = ComponentPoller::new(
            config.component_url.clone(),
            config.component_id.clone(),
            Duration::from_millis(config.component_poll_timeout_ms),
            Duration::from_secs(config.component_poll_cache_seconds),
            POLL_RATE_WINDOW,
            config.component_poll_rate_limit_per_minute,
        );
        let depot = StorageMetadataClient::new(config.depot_url.clone());
        let ledger = GlobalLedgerGate::new(
            config.allow_global_ledger,
            config.global_ledger_url.clone(),
        );

        Self {
            config,
            cache,
            mirror,
            poller,
            depot,
            ledger,
        }
    }

    /// The projection cache. Write boundary for the projection feed.
    pub fn cache(&self) -> &ProjectionCache {
        &self.cache
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Derived status for a task lineage.
    ///
    /// Cache hit → returned as-is. Miss → recompute from the mirror over
    /// the default bounded window, write back, attribute the mirror. Mirror
    /// down → degrade to `Unknown` without caching.
    pub async fn get_status(
        &self,
        tenant_id: &str,
        root_task_id: &str,
    ) -> Result<(StatusSummary, ResponseMetadata), QueryError> {
        if let Some((status, age_ms)) = self.cache.get_status(tenant_id, root_task_id) {
            debug!(tenant_id, root_task_id, age_ms, "status served from projection cache");
            return Ok((status, ResponseMetadata::cached(age_ms)));
        }

        let since = bounds::resolve_since(
            &RequestControls::default(),
            self.config.default_time_window_hours,
            self.config.max_time_window_hours,
            Utc::now(),
        );

        let headers = match self
            .mirror
            .query_receipt_headers(tenant_id, root_task_id, None, None, since, self.config.max_limit)
            .await
        {
            Ok(headers) => headers,
            Err(SourceError::Unavailable(reason)) => {
                warn!(tenant_id, root_task_id, %reason, "mirror unavailable, degrading status to unknown");
                return Ok((
                    StatusSummary::unknown(tenant_id, root_task_id),
                    ResponseMetadata::cached(0),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        // Best-effort shipment check over the first few completed receipts;
        // a single fetch failure abandons the whole check so a partial
        // positive is never reported.
        let mut candidates: Vec<FullReceipt> = Vec::new();
        let mut fetch_failed = false;
        for header in headers
            .iter()
            .filter(|h| h.phase == phase::COMPLETE)
            .take(MAX_SHIPMENT_PROBES)
        {
            match self.mirror.get_receipt(tenant_id, &header.receipt_id).await {
                Ok(Some(receipt)) => candidates.push(receipt),
                Ok(None) => {}
                Err(e) => {
                    warn!(receipt_id = %header.receipt_id, error = %e, "shipment check abandoned");
                    fetch_failed = true;
                    break;
                }
            }
        }

        let probed = candidates.len();
        let shipment_candidates = if fetch_failed {
            None
        } else {
            Some(candidates.as_slice())
        };

        let status = derive::derive_status(tenant_id, root_task_id, &headers, shipment_candidates);
        self.cache.cache_status(status.clone());

        let metadata = ResponseMetadata {
            source: LedgerMirrorClient::SOURCE,
            freshness_age_ms: 0,
            truncated: false,
            next_page_token: None,
            cost_units: query_cost(LedgerMirrorClient::SOURCE, headers.len()) + probed as u32,
        };

        Ok((status, metadata))
    }

    /// Search receipt headers for a lineage under the requested freshness
    /// policy. Search never writes the cache.
    pub async fn search_receipts(
        &self,
        request: &SearchReceiptsRequest,
    ) -> Result<(Vec<ReceiptHeader>, ResponseMetadata), QueryError> {
        let controls = &request.controls;
        let limit = bounds::clamp_limit(controls.limit, self.config.default_limit, self.config.max_limit);
        let since = bounds::resolve_since(
            controls,
            self.config.default_time_window_hours,
            self.config.max_time_window_hours,
            Utc::now(),
        );

        let from_cache = |headers: Vec<ReceiptHeader>, age_ms: u64| {
            let truncated = headers.len() >= limit as usize;
            let metadata = ResponseMetadata {
                truncated,
                ..ResponseMetadata::cached(age_ms)
            };
            (headers, metadata)
        };
        let from_mirror = |headers: Vec<ReceiptHeader>| {
            let metadata = ResponseMetadata {
                source: LedgerMirrorClient::SOURCE,
                freshness_age_ms: 0,
                truncated: headers.len() >= limit as usize,
                next_page_token: None,
                cost_units: query_cost(LedgerMirrorClient::SOURCE, headers.len()),
            };
            (headers, metadata)
        };

        let query_mirror = || {
            self.mirror.query_receipt_headers(
                &request.tenant_id,
                &request.root_task_id,
                request.phase.as_deref(),
                request.recipient_ai.as_deref(),
                since,
                limit,
            )
        };

        match controls.freshness {
            spyglass_domain::Freshness::CacheOk => {
                let (headers, age_ms) = self.cache.search_receipt_headers(
                    &request.tenant_id,
                    &request.root_task_id,
                    request.phase.as_deref(),
                    request.recipient_ai.as_deref(),
                    since,
                    limit as usize,
                );
                if !headers.is_empty() {
                    return Ok(from_cache(headers, age_ms));
                }

                match query_mirror().await {
                    Ok(headers) => Ok(from_mirror(headers)),
                    Err(SourceError::Unavailable(reason)) => {
                        warn!(%reason, "mirror unavailable, returning empty cached search");
                        Ok(from_cache(Vec::new(), 0))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            spyglass_domain::Freshness::PreferFresh => match query_mirror().await {
                Ok(headers) => Ok(from_mirror(headers)),
                Err(SourceError::Unavailable(reason)) => {
                    warn!(%reason, "mirror unavailable, falling back to projection cache");
                    let (headers, age_ms) = self.cache.search_receipt_headers(
                        &request.tenant_id,
                        &request.root_task_id,
                        request.phase.as_deref(),
                        request.recipient_ai.as_deref(),
                        since,
                        limit as usize,
                    );
                    Ok(from_cache(headers, age_ms))
                }
                Err(e) => Err(e.into()),
            },
            spyglass_domain::Freshness::ForceFresh => {
                let headers = query_mirror().await?;
                Ok(from_mirror(headers))
            }
        }
    }

    /// Fetch a single receipt: cache first, then the mirror with a cache
    /// write-back on hit. Absence is `Ok(None)`, not an error.
    pub async fn get_receipt(
        &self,
        tenant_id: &str,
        receipt_id: &str,
    ) -> Result<(Option<FullReceipt>, ResponseMetadata), QueryError> {
        if let Some((receipt, age_ms)) = self.cache.get_receipt(tenant_id, receipt_id) {
            return Ok((Some(receipt), ResponseMetadata::cached(age_ms)));
        }

        match self.mirror.get_receipt(tenant_id, receipt_id).await {
            Ok(Some(receipt)) => {
                self.cache.cache_receipt(receipt.clone());
                let metadata = ResponseMetadata {
                    source: LedgerMirrorClient::SOURCE,
                    freshness_age_ms: 0,
                    truncated: false,
                    next_page_token: None,
                    cost_units: LedgerMirrorClient::SOURCE.base_cost() + 1,
                };
                Ok((Some(receipt), metadata))
            }
            Ok(None) => Ok((None, ResponseMetadata::live(LedgerMirrorClient::SOURCE))),
            Err(SourceError::Unavailable(reason)) => {
                warn!(tenant_id, receipt_id, %reason, "mirror unavailable, receipt lookup degrades to not-found");
                Ok((None, ResponseMetadata::cached(0)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Live component health. Outage degrades to `reachable = false`; a
    /// rate-limit rejection always surfaces.
    pub async fn poll_health(
        &self,
        tenant_id: &str,
        verbose: bool,
    ) -> Result<(HealthReport, ResponseMetadata), QueryError> {
        match self.poller.poll_health(tenant_id, verbose).await {
            Ok((snapshot, age_ms)) => {
                let report = HealthReport {
                    component_id: snapshot
                        .component_id
                        .unwrap_or_else(|| self.poller.component_id().to_string()),
                    reachable: true,
                    version: snapshot.version,
                    uptime_seconds: snapshot.uptime_seconds,
                    error_budget_status: snapshot.error_budget_status,
                    metrics_snapshot: if verbose { snapshot.metrics } else { None },
                };
                let metadata = ResponseMetadata {
                    source: ComponentPoller::SOURCE,
                    freshness_age_ms: age_ms,
                    truncated: false,
                    next_page_token: None,
                    cost_units: ComponentPoller::SOURCE.base_cost(),
                };
                Ok((report, metadata))
            }
            Err(SourceError::Unavailable(reason)) => {
                warn!(tenant_id, %reason, "component unreachable");
                let metadata = ResponseMetadata {
                    source: ComponentPoller::SOURCE,
                    freshness_age_ms: 0,
                    truncated: false,
                    next_page_token: None,
                    cost_units: 1,
                };
                Ok((
                    HealthReport::unreachable(self.poller.component_id()),
                    metadata,
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Live queue diagnostics, bounded item headers only. Outage degrades
    /// to an empty report; a rate-limit rejection always surfaces.
    pub async fn poll_queue(
        &self,
        tenant_id: &str,
        queue_id: Option<&str>,
        limit: Option<u32>,
        include_examples: bool,
    ) -> Result<(QueueReport, ResponseMetadata), QueryError> {
        let limit = bounds::clamp_limit(limit, DEFAULT_QUEUE_LIMIT, MAX_QUEUE_LIMIT);

        match self
            .poller
            .poll_queue(tenant_id, queue_id, limit as usize, include_examples)
            .await
        {
            Ok((snapshot, age_ms)) => {
                let truncated = snapshot.items.len() >= limit as usize;
                let report = QueueReport {
                    queue_depth: snapshot.queue_depth,
                    oldest_item_age_ms: snapshot.oldest_item_age_ms,
                    active_leases_count: snapshot.active_leases_count,
                    items: snapshot.items,
                };
                let metadata = ResponseMetadata {
                    source: ComponentPoller::SOURCE,
                    freshness_age_ms: age_ms,
                    truncated,
                    next_page_token: None,
                    cost_units: ComponentPoller::SOURCE.base_cost(),
                };
                Ok((report, metadata))
            }
            Err(SourceError::Unavailable(reason)) => {
                warn!(tenant_id, %reason, "component unreachable, returning empty queue report");
                let metadata = ResponseMetadata {
                    source: ComponentPoller::SOURCE,
                    freshness_age_ms: 0,
                    truncated: false,
                    next_page_token: None,
                    cost_units: 1,
                };
                Ok((QueueReport::default(), metadata))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Artifact inventory for a lineage or deliverable. Requires at least
    /// one identifier; source failures propagate.
    pub async fn list_artifacts(
        &self,
        tenant_id: &str,
        root_task_id: Option<&str>,
        deliverable_id: Option<&str>,
        controls: &RequestControls,
    ) -> Result<(ArtifactInventory, ResponseMetadata), QueryError> {
        if root_task_id.is_none() && deliverable_id.is_none() {
            return Err(QueryError::Validation(
                "either root_task_id or deliverable_id is required".to_string(),
            ));
        }

        let limit = bounds::clamp_limit(controls.limit, self.config.default_limit, self.config.max_limit);

        let inventory = self
            .depot
            .list_artifacts(tenant_id, root_task_id, deliverable_id, limit)
            .await?;

        let metadata = ResponseMetadata {
            source: StorageMetadataClient::SOURCE,
            freshness_age_ms: 0,
            truncated: inventory.artifact_pointers.len() >= limit as usize,
            next_page_token: None,
            cost_units: query_cost(StorageMetadataClient::SOURCE, inventory.artifact_pointers.len()),
        };

        Ok((inventory, metadata))
    }

    /// Query the authoritative global ledger. Gated by the explicit opt-in
    /// flag; never part of any other operation's fallback chain.
    pub async fn query_global_ledger(
        &self,
        tenant_id: &str,
        root_task_id: &str,
    ) -> Result<(Vec<ReceiptHeader>, ResponseMetadata), QueryError> {
        let headers = self.ledger.query_receipt_headers(tenant_id, root_task_id).await?;
        Ok((headers, ResponseMetadata::live(GlobalLedgerGate::SOURCE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyglass_domain::{Freshness, TaskState};

    fn manager() -> SourceManager {
        SourceManager::new(EngineConfig::default_test_config())
    }

    // created_at must fall inside the default search window
    fn header(id: &str, phase: &str) -> ReceiptHeader {
        ReceiptHeader {
            receipt_id: id.to_string(),
            phase: phase.to_string(),
            task_id: format!("task-{}", id),
            root_task_id: Some("root-1".to_string()),
            tenant_id: "acme".to_string(),
            recipient_ai: None,
            created_at: Some(Utc::now()),
            stored_at: None,
        }
    }

    fn search_request(freshness: Freshness) -> SearchReceiptsRequest {
        SearchReceiptsRequest {
            tenant_id: "acme".to_string(),
            root_task_id: "root-1".to_string(),
            phase: None,
            recipient_ai: None,
            controls: RequestControls {
                freshness,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_status_degrades_to_unknown_without_mirror() {
        let m = manager();
        let (status, metadata) = m.get_status("acme", "root-1").await.unwrap();

        assert_eq!(status.state, TaskState::Unknown);
        assert_eq!(metadata.source, Source::ProjectionCache);
        assert_eq!(metadata.cost_units, 1);
    }

    #[tokio::test]
    async fn test_status_cache_hit_short_circuits() {
        let m = manager();
        let mut cached = StatusSummary::unknown("acme", "root-1");
        cached.state = TaskState::Resolved;
        m.cache().cache_status(cached);

        let (status, metadata) = m.get_status("acme", "root-1").await.unwrap();
        assert_eq!(status.state, TaskState::Resolved);
        assert_eq!(metadata.source, Source::ProjectionCache);
    }

    #[tokio::test]
    async fn test_search_cache_ok_serves_cached_headers() {
        let m = manager();
        m.cache()
            .cache_headers("acme", "root-1", vec![header("r-1", "accepted")]);

        let (headers, metadata) = m.search_receipts(&search_request(Freshness::CacheOk)).await.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(metadata.source, Source::ProjectionCache);
        assert!(!metadata.truncated);
    }

    #[tokio::test]
    async fn test_search_cache_ok_degrades_to_empty_when_all_down() {
        let m = manager();
        let (headers, metadata) = m.search_receipts(&search_request(Freshness::CacheOk)).await.unwrap();

        assert!(headers.is_empty());
        assert_eq!(metadata.source, Source::ProjectionCache);
    }

    #[tokio::test]
    async fn test_search_prefer_fresh_falls_back_to_cache() {
        let m = manager();
        m.cache()
            .cache_headers("acme", "root-1", vec![header("r-1", "accepted")]);

        let (headers, metadata) = m
            .search_receipts(&search_request(Freshness::PreferFresh))
            .await
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(metadata.source, Source::ProjectionCache);
    }

    #[tokio::test]
    async fn test_search_force_fresh_propagates_mirror_outage() {
        let m = manager();
        m.cache()
            .cache_headers("acme", "root-1", vec![header("r-1", "accepted")]);

        let result = m.search_receipts(&search_request(Freshness::ForceFresh)).await;
        assert!(matches!(result, Err(QueryError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_search_truncation_at_exact_limit() {
        let m = manager();
        m.cache().cache_headers(
            "acme",
            "root-1",
            vec![header("r-1", "accepted"), header("r-2", "accepted")],
        );

        let mut request = search_request(Freshness::CacheOk);
        request.controls.limit = Some(2);
        let (headers, metadata) = m.search_receipts(&request).await.unwrap();
        assert_eq!(headers.len(), 2);
        assert!(metadata.truncated);

        let mut request = search_request(Freshness::CacheOk);
        request.controls.limit = Some(3);
        let (_, metadata) = m.search_receipts(&request).await.unwrap();
        assert!(!metadata.truncated);
    }

    #[tokio::test]
    async fn test_get_receipt_degrades_to_not_found() {
        let m = manager();
        let (receipt, metadata) = m.get_receipt("acme", "r-404").await.unwrap();

        assert!(receipt.is_none());
        assert_eq!(metadata.source, Source::ProjectionCache);
    }

    #[tokio::test]
    async fn test_health_degrades_to_unreachable() {
        let m = manager();
        let (report, metadata) = m.poll_health("acme", true).await.unwrap();

        assert!(!report.reachable);
        assert_eq!(report.component_id, "gate");
        assert_eq!(metadata.source, Source::ComponentPoll);
        assert_eq!(metadata.cost_units, 1);
    }

    #[tokio::test]
    async fn test_queue_degrades_to_empty_report() {
        let m = manager();
        let (report, metadata) = m.poll_queue("acme", None, Some(10), true).await.unwrap();

        assert_eq!(report.queue_depth, 0);
        assert!(report.items.is_empty());
        assert_eq!(metadata.source, Source::ComponentPoll);
    }

    #[tokio::test]
    async fn test_artifacts_require_an_identifier() {
        let m = manager();
        let result = m
            .list_artifacts("acme", None, None, &RequestControls::default())
            .await;
        assert!(matches!(result, Err(QueryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_artifacts_propagate_unavailability() {
        let m = manager();
        let result = m
            .list_artifacts("acme", Some("root-1"), None, &RequestControls::default())
            .await;
        assert!(matches!(result, Err(QueryError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_global_ledger_disabled_by_default() {
        let m = manager();
        let result = m.query_global_ledger("acme", "root-1").await;
        assert!(matches!(result, Err(QueryError::GlobalLedgerDisabled)));
    }
}
