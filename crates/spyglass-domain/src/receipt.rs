//! Receipt shapes: compact headers and full receipts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receipt phase values with derivation significance.
///
/// Phases are open-ended wire strings; these are the ones the status
/// derivation recognizes.
pub mod phase {
    /// Task step accepted for processing
    pub const ACCEPTED: &str = "accepted";
    /// Task step completed
    pub const COMPLETE: &str = "complete";
    /// Task step escalated
    pub const ESCALATE: &str = "escalate";
}

/// Compact, immutable receipt header.
///
/// Many headers sharing `(tenant_id, root_task_id)` form one lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptHeader {
    /// Receipt identifier
    pub receipt_id: String,
    /// Processing phase this receipt records (`accepted`, `complete`,
    /// `escalate`, ...)
    pub phase: String,
    /// Task the receipt belongs to
    pub task_id: String,
    /// Root of the task lineage
    pub root_task_id: Option<String>,
    /// Owning tenant
    pub tenant_id: String,
    /// Recipient the task step was addressed to
    pub recipient_ai: Option<String>,
    /// When the step occurred
    pub created_at: Option<DateTime<Utc>>,
    /// When the receipt was persisted
    pub stored_at: Option<DateTime<Utc>>,
}

impl ReceiptHeader {
    /// Best-available event timestamp: `created_at`, falling back to
    /// `stored_at`. `None` sorts as the earliest possible value.
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.stored_at)
    }
}

/// Full receipt: header fields plus outcome and escalation detail.
///
/// One-to-one with a receipt id. The `redacted` flag marks receipts whose
/// fields were stripped by the serving side before delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullReceipt {
    /// Receipt identifier
    pub receipt_id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Task the receipt belongs to
    pub task_id: String,
    /// Root of the task lineage
    pub root_task_id: Option<String>,
    /// Direct parent task, when the task was spawned by another
    pub parent_task_id: Option<String>,
    /// Receipt that caused this task step
    pub caused_by_receipt_id: Option<String>,
    /// Processing phase this receipt records
    pub phase: String,
    /// Step status string as recorded by the processing component
    pub status: Option<String>,
    /// Principal the step was performed on behalf of
    pub from_principal: Option<String>,
    /// Principal the step's outcome is addressed to
    pub for_principal: Option<String>,
    /// System that emitted the receipt
    pub source_system: Option<String>,
    /// Recipient the task step was addressed to
    pub recipient_ai: Option<String>,
    /// Task type label
    pub task_type: Option<String>,
    /// Short human-readable task summary
    pub task_summary: Option<String>,
    /// Outcome classification
    pub outcome_kind: Option<String>,
    /// Outcome description
    pub outcome_text: Option<String>,
    /// Pointer to a staged artifact produced by this step (never the bytes)
    pub artifact_pointer: Option<String>,
    /// Escalation class, when the step escalated
    pub escalation_class: Option<String>,
    /// Why the step escalated
    pub escalation_reason: Option<String>,
    /// Where the escalation was routed
    pub escalation_to: Option<String>,
    /// When the step occurred
    pub created_at: Option<DateTime<Utc>>,
    /// When the receipt was persisted
    pub stored_at: Option<DateTime<Utc>>,
    /// When the step completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether fields were redacted
    #[serde(default)]
    pub redacted: bool,
}

impl FullReceipt {
    /// Header projection of this receipt.
    pub fn header(&self) -> ReceiptHeader {
        ReceiptHeader {
            receipt_id: self.receipt_id.clone(),
            phase: self.phase.clone(),
            task_id: self.task_id.clone(),
            root_task_id: self.root_task_id.clone(),
            tenant_id: self.tenant_id.clone(),
            recipient_ai: self.recipient_ai.clone(),
            created_at: self.created_at,
            stored_at: self.stored_at,
        }
    }
}
