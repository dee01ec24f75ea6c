//! Read-only downstream operation allowlist
//!
//! Spyglass is observational only. Every source client asserts its
//! downstream operation against this allowlist before issuing a request, so
//! a future edit that wires in a mutating call fails at the first test that
//! exercises it rather than at a backing store.

use crate::error::SourceError;

/// Downstream operations Spyglass is permitted to perform.
pub const READ_ONLY_OPERATIONS: &[&str] = &[
    "receipts/search",
    "receipts/get",
    "health",
    "queues/diagnostics",
    "artifacts/metadata",
];

/// Assert that `operation` is a permitted read-only downstream operation.
pub fn assert_read_only(operation: &str) -> Result<(), SourceError> {
    if READ_ONLY_OPERATIONS.contains(&operation) {
        Ok(())
    } else {
        Err(SourceError::ReadOnlyViolation(operation.to_string()))
    }
}
