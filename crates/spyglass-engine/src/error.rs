//! Engine error taxonomy

use spyglass_sources::SourceError;
use thiserror::Error;

/// Errors surfaced to callers of the source manager.
///
/// Chain-internal failures (cache miss, one source down mid-chain) never
/// appear here; they are absorbed by the fallback policy. What does appear
/// is chain exhaustion on operations that propagate, policy denial, rate
/// limiting, and input validation.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Missing or malformed required identifier; no source was consulted
    #[error("validation error: {0}")]
    Validation(String),

    /// Every eligible source failed for an operation that propagates
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Component poll budget exhausted; surfaced, never substituted
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Global ledger policy gate; requires explicit operator opt-in
    #[error("global ledger access is disabled; ask an operator to set allow_global_ledger = true")]
    GlobalLedgerDisabled,
}

impl From<SourceError> for QueryError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Unavailable(reason) => QueryError::SourceUnavailable(reason),
            SourceError::RateLimited(reason) => QueryError::RateLimited(reason),
            SourceError::GlobalLedgerDisabled => QueryError::GlobalLedgerDisabled,
            SourceError::ReadOnlyViolation(op) => {
                QueryError::SourceUnavailable(format!("read-only violation: {}", op))
            }
        }
    }
}
