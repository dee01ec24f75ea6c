//! Spyglass Domain Layer
//!
//! Core domain model for Spyglass, the read-only observability facade over
//! the task/receipt ledger mesh. This crate defines the value objects shared
//! by every other layer: backing-source identity, freshness policy, request
//! controls, receipt shapes, derived status, artifact pointers, and the
//! diagnostic payloads.
//!
//! ## Key Concepts
//!
//! - **Receipt**: an immutable record of one step/outcome in a task's
//!   processing; many receipts sharing a root task id form a *lineage*
//! - **Source**: which backing store answered a query, in strict
//!   precedence order
//! - **Freshness**: caller-selectable trade-off between cached staleness
//!   and live-query cost
//! - **Response metadata**: attribution, data age, truncation, and cost
//!   attached to every response
//!
//! This crate contains no I/O and no policy; the resolution engine lives in
//! `spyglass-engine`, the source clients in `spyglass-sources`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod controls;
pub mod diagnostics;
pub mod receipt;
pub mod source;
pub mod status;

// Re-exports for convenience
pub use artifact::{ArtifactInventory, ArtifactPointer, StagedCounts};
pub use controls::{Freshness, RequestControls, ResponseMetadata};
pub use diagnostics::{HealthReport, MetricsSnapshot, QueueItemHeader, QueueReport};
pub use receipt::{FullReceipt, ReceiptHeader};
pub use source::Source;
pub use status::{StatusSummary, TaskState};
