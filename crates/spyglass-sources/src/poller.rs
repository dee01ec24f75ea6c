//! Component poller: rate-limited live diagnostics
//!
//! Polls the live task-processing gate for health and queue diagnostics.
//! Two guards precede every network call, in order: the poll-result cache
//! (a fresh hit returns before any rate-limit consumption), then the
//! per-component sliding-window rate limiter. Rate-limit rejection is a
//! distinct signal from unavailability and is never substituted with a
//! fallback. Calls use a short fixed timeout; responses are cache-written
//! only after a call fully succeeds.

use crate::error::SourceError;
use crate::rate_limit::RateLimiter;
use crate::readonly;
use serde::Deserialize;
use spyglass_domain::{MetricsSnapshot, QueueItemHeader, Source};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Queue item headers are capped here regardless of caller request
pub const MAX_QUEUE_ITEMS: usize = 50;

/// Health payload reported by the polled component
#[derive(Debug, Clone, Deserialize)]
pub struct HealthSnapshot {
    /// Component self-identification, when reported
    pub component_id: Option<String>,
    /// Component version
    pub version: Option<String>,
    /// Uptime in seconds
    pub uptime_seconds: Option<u64>,
    /// Error-budget status label
    pub error_budget_status: Option<String>,
    /// Verbose metrics, present when requested
    pub metrics: Option<MetricsSnapshot>,
}

/// Queue diagnostics payload reported by the polled component
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSnapshot {
    /// Items currently queued
    #[serde(default)]
    pub queue_depth: u64,
    /// Age of the oldest queued item in milliseconds
    #[serde(default)]
    pub oldest_item_age_ms: u64,
    /// Leases currently held
    #[serde(default)]
    pub active_leases_count: u64,
    /// Bounded item headers
    #[serde(default)]
    pub items: Vec<QueueItemHeader>,
}

type HealthKey = (String, bool);
type QueueKey = (String, Option<String>, usize, bool);

struct CachedPoll<T> {
    value: T,
    polled_at: Instant,
}

/// Rate-limited, short-timeout, short-TTL-cached client for the live
/// component. The only source that talks to a live mutable system, and it
/// only ever reads.
pub struct ComponentPoller {
    endpoint: Option<String>,
    component_id: String,
    client: reqwest::Client,
    cache_ttl: Duration,
    limiter: RateLimiter,
    health_cache: Mutex<HashMap<HealthKey, CachedPoll<HealthSnapshot>>>,
    queue_cache: Mutex<HashMap<QueueKey, CachedPoll<QueueSnapshot>>>,
}

impl ComponentPoller {
    /// Capability tag for response attribution
    pub const SOURCE: Source = Source::ComponentPoll;

    /// Create a poller.
    ///
    /// `timeout` applies to every outbound call; `cache_ttl` bounds how long
    /// a poll result is reused; `rate_window`/`max_calls_per_window` bound
    /// outbound call volume per component.
    pub fn new(
        endpoint: Option<String>,
        component_id: String,
        timeout: Duration,
        cache_ttl: Duration,
        rate_window: Duration,
        max_calls_per_window: u32,
    ) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();

        Self {
            endpoint,
            component_id,
            client,
            cache_ttl,
            limiter: RateLimiter::new(rate_window, max_calls_per_window),
            health_cache: Mutex::new(HashMap::new()),
            queue_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Identifier of the polled component.
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    fn read_cached<K: std::hash::Hash + Eq, T: Clone>(
        &self,
        cache: &Mutex<HashMap<K, CachedPoll<T>>>,
        key: &K,
    ) -> Option<(T, u64)> {
        let mut cache = cache.lock().unwrap();
        if let Some(entry) = cache.get(key) {
            let age = entry.polled_at.elapsed();
            if age < self.cache_ttl {
                return Some((entry.value.clone(), age.as_millis() as u64));
            }
            cache.remove(key);
        }
        None
    }

    fn write_cached<K: std::hash::Hash + Eq, T>(
        &self,
        cache: &Mutex<HashMap<K, CachedPoll<T>>>,
        key: K,
        value: T,
    ) {
        cache.lock().unwrap().insert(
            key,
            CachedPoll {
                value,
                polled_at: Instant::now(),
            },
        );
    }

    /// Guards shared by both poll operations: endpoint presence, then one
    /// rate-limit slot. The slot is consumed before the network call.
    fn acquire_call_slot(&self) -> Result<&str, SourceError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("component endpoint not configured".to_string()))?;

        if !self.limiter.try_acquire(&self.component_id) {
            return Err(SourceError::RateLimited(format!(
                "poll budget exhausted for component {}",
                self.component_id
            )));
        }

        Ok(endpoint)
    }

    fn poll_failure(&self, operation: &str, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Unavailable(format!("component {} poll timed out", operation))
        } else {
            SourceError::Unavailable(format!("component {} poll failed: {}", operation, e))
        }
    }

    /// Poll component health. Returns the snapshot and its age in
    /// milliseconds (0 for a live poll).
    pub async fn poll_health(
        &self,
        tenant_id: &str,
        verbose: bool,
    ) -> Result<(HealthSnapshot, u64), SourceError> {
        readonly::assert_read_only("health")?;

        let key = (tenant_id.to_string(), verbose);
        if let Some(hit) = self.read_cached(&self.health_cache, &key) {
            return Ok(hit);
        }

        let endpoint = self.acquire_call_slot()?;

        debug!(tenant_id, verbose, component = %self.component_id, "polling component health");

        let params: Vec<(&str, String)> = vec![
            ("tenant_id", tenant_id.to_string()),
            ("verbose", verbose.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/health", endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| self.poll_failure("health", e))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "component health poll returned HTTP {}",
                response.status()
            )));
        }

        let snapshot: HealthSnapshot = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("component returned malformed health payload: {}", e))
        })?;

        self.write_cached(&self.health_cache, key, snapshot.clone());
        Ok((snapshot, 0))
    }

    /// Poll queue diagnostics. Item headers are truncated to
    /// `min(limit, MAX_QUEUE_ITEMS)` no matter what the component returns.
    pub async fn poll_queue(
        &self,
        tenant_id: &str,
        queue_id: Option<&str>,
        limit: usize,
        include_examples: bool,
    ) -> Result<(QueueSnapshot, u64), SourceError> {
        readonly::assert_read_only("queues/diagnostics")?;

        let limit = limit.min(MAX_QUEUE_ITEMS);
        let key = (
            tenant_id.to_string(),
            queue_id.map(str::to_string),
            limit,
            include_examples,
        );
        if let Some(hit) = self.read_cached(&self.queue_cache, &key) {
            return Ok(hit);
        }

        let endpoint = self.acquire_call_slot()?;

        let mut params: Vec<(&str, String)> = vec![
            ("tenant_id", tenant_id.to_string()),
            ("limit", limit.to_string()),
            ("include_examples", include_examples.to_string()),
        ];
        if let Some(queue_id) = queue_id {
            params.push(("queue_id", queue_id.to_string()));
        }

        debug!(tenant_id, limit, component = %self.component_id, "polling component queue");

        let response = self
            .client
            .get(format!("{}/queues/diagnostics", endpoint))
            .query(&params)
            .send()
            .await
            .map_err(|e| self.poll_failure("queue", e))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "component queue poll returned HTTP {}",
                response.status()
            )));
        }

        let mut snapshot: QueueSnapshot = response.json().await.map_err(|e| {
            SourceError::Unavailable(format!("component returned malformed queue payload: {}", e))
        })?;

        if !include_examples {
            snapshot.items.clear();
        }
        snapshot.items.truncate(limit);

        self.write_cached(&self.queue_cache, key, snapshot.clone());
        Ok((snapshot, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller(endpoint: Option<String>, max_calls: u32) -> ComponentPoller {
        ComponentPoller::new(
            endpoint,
            "gate".to_string(),
            Duration::from_millis(500),
            Duration::from_secs(5),
            Duration::from_secs(60),
            max_calls,
        )
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_is_unavailable() {
        let p = poller(None, 60);
        let result = p.poll_health("acme", false).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_consumes_no_rate_budget() {
        let p = poller(None, 1);

        for _ in 0..3 {
            let result = p.poll_health("acme", false).await;
            // Unavailable every time, never RateLimited
            assert!(matches!(result, Err(SourceError::Unavailable(_))));
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinct_from_unavailability() {
        // Unreachable endpoint: calls consume slots, then fail in transport
        let p = poller(Some("http://127.0.0.1:9".to_string()), 2);

        for _ in 0..2 {
            let result = p.poll_health("acme", false).await;
            assert!(matches!(result, Err(SourceError::Unavailable(_))));
        }

        // Budget exhausted before the transport is even tried
        let result = p.poll_health("acme", false).await;
        assert!(matches!(result, Err(SourceError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_queue_limit_capped_at_fifty() {
        let p = poller(None, 60);
        // Even an absurd limit never reaches the wire above the cap; here it
        // fails on configuration, but the cap is applied first and the cache
        // key reflects the capped value.
        let result = p.poll_queue("acme", None, 9999, true).await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
        assert_eq!(MAX_QUEUE_ITEMS, 50);
    }
}
