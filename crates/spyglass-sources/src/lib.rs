//! Spyglass Source Clients
//!
//! Clients for the backing sources consulted by the resolution engine:
//!
//! - [`ProjectionCache`]: process-local TTL store, preferred for every read
//! - [`LedgerMirrorClient`]: read-replica receipt store
//! - [`ComponentPoller`]: rate-limited live component diagnostics
//! - [`StorageMetadataClient`]: artifact-pointer index (metadata only)
//! - [`GlobalLedgerGate`]: opt-in gated access to the authoritative ledger
//!
//! Every client is strictly read-only: outbound operations are checked
//! against the allowlist in [`readonly`] before a request is issued, and no
//! client exposes any mutating call. Fallback and retry policy live in the
//! orchestrator (`spyglass-engine`), not here.

pub mod cache;
pub mod depot;
pub mod error;
pub mod ledger;
pub mod mirror;
pub mod poller;
pub mod rate_limit;
pub mod readonly;

pub use cache::ProjectionCache;
pub use depot::StorageMetadataClient;
pub use error::SourceError;
pub use ledger::GlobalLedgerGate;
pub use mirror::LedgerMirrorClient;
pub use poller::{ComponentPoller, HealthSnapshot, QueueSnapshot};
pub use rate_limit::RateLimiter;
