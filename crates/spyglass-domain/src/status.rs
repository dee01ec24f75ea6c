//! Derived lineage status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived state of a task lineage, ordered by derivation priority.
///
/// Only `Unknown`, `InProgress`, `Escalated`, `Resolved`, and `Shipped`
/// are produced by the derivation algorithm in this version; `Accepted`
/// and `Blocked` are reserved for receipt phases a future mirror schema
/// may surface directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No receipts observed for the lineage
    Unknown,
    /// Lineage accepted but no progress receipts yet
    Accepted,
    /// At least one accepted-phase receipt
    InProgress,
    /// At least one escalate-phase receipt and no completion
    Escalated,
    /// Lineage blocked awaiting external input
    Blocked,
    /// At least one complete-phase receipt
    Resolved,
    /// A completed receipt carries a shipment marker
    Shipped,
}

impl TaskState {
    /// String form used in responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Unknown => "unknown",
            TaskState::Accepted => "accepted",
            TaskState::InProgress => "in_progress",
            TaskState::Escalated => "escalated",
            TaskState::Blocked => "blocked",
            TaskState::Resolved => "resolved",
            TaskState::Shipped => "shipped",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived status summary for one task lineage.
///
/// Never stored authoritatively: recomputed on demand from receipt
/// headers and cached opportunistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Owning tenant
    pub tenant_id: String,
    /// Root of the task lineage
    pub root_task_id: String,
    /// Derived state
    pub state: TaskState,
    /// Most recent receipt in the lineage
    pub latest_receipt_id: Option<String>,
    /// Timestamp of the most recent receipt
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Obligations still open against the lineage, when derivable
    pub open_obligations_count: Option<u32>,
    /// Shipment status label, when the lineage shipped
    pub shipment_status: Option<String>,
    /// Pointer to the shipment manifest, when the lineage shipped
    pub shipment_manifest_pointer: Option<String>,
    /// Pointers to artifacts associated with the lineage
    #[serde(default)]
    pub artifact_pointers: Vec<String>,
}

impl StatusSummary {
    /// Summary for a lineage with no observable receipts.
    pub fn unknown(tenant_id: impl Into<String>, root_task_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            root_task_id: root_task_id.into(),
            state: TaskState::Unknown,
            latest_receipt_id: None,
            last_updated_at: None,
            open_obligations_count: None,
            shipment_status: None,
            shipment_manifest_pointer: None,
            artifact_pointers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_priority_order() {
        assert!(TaskState::Unknown < TaskState::InProgress);
        assert!(TaskState::InProgress < TaskState::Escalated);
        assert!(TaskState::Escalated < TaskState::Resolved);
        assert!(TaskState::Resolved < TaskState::Shipped);
    }

    #[test]
    fn test_state_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskState::InProgress).unwrap(),
            r#""in_progress""#
        );
        let s: TaskState = serde_json::from_str(r#""shipped""#).unwrap();
        assert_eq!(s, TaskState::Shipped);
    }

    #[test]
    fn test_unknown_summary() {
        let s = StatusSummary::unknown("acme", "root-1");
        assert_eq!(s.state, TaskState::Unknown);
        assert_eq!(s.latest_receipt_id, None);
        assert!(s.artifact_pointers.is_empty());
    }
}
