//! Tool handlers for the Spyglass MCP server
//!
//! One module per tool. Each handler parses its parameters, calls the
//! source manager, and returns a serializable result.

pub mod artifacts;
pub mod get;
pub mod health;
pub mod ledger;
pub mod queue;
pub mod search;
pub mod status;

pub use artifacts::{handle_artifact_inventory, ArtifactInventoryParams};
pub use get::{handle_get_receipt, GetReceiptParams};
pub use health::{handle_component_health, ComponentHealthParams};
pub use ledger::{handle_global_ledger, GlobalLedgerParams};
pub use queue::{handle_queue_diagnostics, QueueDiagnosticsParams};
pub use search::handle_search_receipts;
pub use status::{handle_status, StatusParams};
