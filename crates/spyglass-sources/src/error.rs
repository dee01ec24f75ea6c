//! Error types for source clients

use thiserror::Error;

/// Errors a backing-source client can signal.
///
/// Absence of an entity is never an error: lookups return `Ok(None)`.
/// Rate-limit rejection is deliberately distinct from unavailability so the
/// orchestrator never substitutes a fallback for it, and the global-ledger
/// policy denial is distinct from an outage so callers can tell "ask an
/// operator to enable this" apart from "try again later".
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network failure, timeout, malformed payload, or missing configuration
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Per-component poll budget exhausted for the current window
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Global ledger access is disabled by policy
    #[error("global ledger access is disabled (set allow_global_ledger = true to enable)")]
    GlobalLedgerDisabled,

    /// Attempted downstream operation is not on the read-only allowlist
    #[error("read-only violation: {0}")]
    ReadOnlyViolation(String),
}
