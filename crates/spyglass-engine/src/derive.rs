//! Status derivation: fold receipt headers into a lineage state
//!
//! Pure logic. The orchestrator fetches the shipment-check candidates (up
//! to [`MAX_SHIPMENT_PROBES`] complete-phase receipts) and passes them in;
//! `None` means a fetch failed and the shipment check was abandoned, so a
//! partial positive is never produced.

use spyglass_domain::receipt::phase;
use spyglass_domain::{FullReceipt, ReceiptHeader, StatusSummary, TaskState};

/// Case-insensitive token marking a completed receipt as a shipment
pub const SHIPMENT_MARKER: &str = "shipment";

/// Completed receipts probed for the shipment marker, at most
pub const MAX_SHIPMENT_PROBES: usize = 3;

/// Whether a completed receipt marks the lineage as shipped.
pub fn is_shipment_marker(receipt: &FullReceipt) -> bool {
    let contains_marker = |field: Option<&str>| {
        field.is_some_and(|text| text.to_ascii_lowercase().contains(SHIPMENT_MARKER))
    };

    contains_marker(receipt.task_type.as_deref()) || contains_marker(receipt.outcome_text.as_deref())
}

/// Derive a lineage status from its ordered receipt headers.
///
/// `shipment_candidates` are the fetched complete-phase receipts, in fetch
/// order; `None` disables the shipment check (fetch failure). State
/// priority with no marker: complete ⇒ resolved, escalate ⇒ escalated,
/// accepted ⇒ in-progress, nothing ⇒ unknown. The latest receipt is the
/// header with the greatest effective timestamp; ties keep the first
/// encountered.
pub fn derive_status(
    tenant_id: &str,
    root_task_id: &str,
    headers: &[ReceiptHeader],
    shipment_candidates: Option<&[FullReceipt]>,
) -> StatusSummary {
    let shipment = shipment_candidates.and_then(|candidates| {
        candidates
            .iter()
            .take(MAX_SHIPMENT_PROBES)
            .find(|r| is_shipment_marker(r))
    });

    let state = if shipment.is_some() {
        TaskState::Shipped
    } else if headers.iter().any(|h| h.phase == phase::COMPLETE) {
        TaskState::Resolved
    } else if headers.iter().any(|h| h.phase == phase::ESCALATE) {
        TaskState::Escalated
    } else if headers.iter().any(|h| h.phase == phase::ACCEPTED) {
        TaskState::InProgress
    } else {
        TaskState::Unknown
    };

    let mut latest: Option<&ReceiptHeader> = None;
    for header in headers {
        match latest {
            None => latest = Some(header),
            Some(current) => {
                if header.effective_timestamp() > current.effective_timestamp() {
                    latest = Some(header);
                }
            }
        }
    }

    StatusSummary {
        tenant_id: tenant_id.to_string(),
        root_task_id: root_task_id.to_string(),
        state,
        latest_receipt_id: latest.map(|h| h.receipt_id.clone()),
        last_updated_at: latest.and_then(|h| h.effective_timestamp()),
        open_obligations_count: None,
        shipment_status: shipment.map(|_| "shipped".to_string()),
        shipment_manifest_pointer: shipment.and_then(|r| r.artifact_pointer.clone()),
        artifact_pointers: Vec::new(),
    }
}
