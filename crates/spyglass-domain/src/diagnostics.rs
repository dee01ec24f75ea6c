//! Bounded diagnostic shapes for live component polling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounded metrics snapshot reported by the polled component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Items waiting in queues
    #[serde(default)]
    pub queued_count: u64,
    /// Items currently leased to workers
    #[serde(default)]
    pub leased_count: u64,
    /// Items processed successfully
    #[serde(default)]
    pub succeeded_count: u64,
    /// Items that failed processing
    #[serde(default)]
    pub failed_count: u64,
}

/// Header of one queued item. Never carries the item payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItemHeader {
    /// Queued task identifier
    pub task_id: String,
    /// Task type label
    pub task_type: String,
    /// Queue status of the item
    pub status: String,
    /// Scheduling priority
    #[serde(default)]
    pub priority: i32,
    /// When the item was enqueued
    pub created_at: Option<DateTime<Utc>>,
    /// Age of the item in milliseconds
    #[serde(default)]
    pub age_ms: u64,
}

/// Health of the polled component, as observed by one poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Identifier of the polled component
    pub component_id: String,
    /// Whether the component answered the poll
    pub reachable: bool,
    /// Component version, when reported
    pub version: Option<String>,
    /// Component uptime in seconds, when reported
    pub uptime_seconds: Option<u64>,
    /// Error-budget status label, when reported
    pub error_budget_status: Option<String>,
    /// Verbose metrics, when requested and reported
    pub metrics_snapshot: Option<MetricsSnapshot>,
}

impl HealthReport {
    /// Degraded report for a component that did not answer.
    pub fn unreachable(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            reachable: false,
            version: None,
            uptime_seconds: None,
            error_budget_status: None,
            metrics_snapshot: None,
        }
    }
}

/// Queue diagnostics for the polled component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueReport {
    /// Items currently queued
    pub queue_depth: u64,
    /// Age of the oldest queued item in milliseconds
    pub oldest_item_age_ms: u64,
    /// Leases currently held by workers
    pub active_leases_count: u64,
    /// Bounded item headers, when examples were requested
    #[serde(default)]
    pub items: Vec<QueueItemHeader>,
}
