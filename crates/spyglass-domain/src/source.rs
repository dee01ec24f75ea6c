//! Backing-source identity and precedence

use serde::{Deserialize, Serialize};
use std::fmt;

/// A backing source consulted by the resolution engine.
///
/// Variant order is the strict precedence order for the default fallback
/// chain of status/search/get operations: cheaper, staler sources first.
/// Diagnostics and storage-metadata operations use only their own dedicated
/// source, so this is not a total order across all operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Process-local projection cache (preferred for every read)
    ProjectionCache,
    /// Read-replica receipt store
    LedgerMirror,
    /// Live component poll (health/queue diagnostics)
    ComponentPoll,
    /// Artifact-pointer index (parallel tier, not in the fallback chain)
    StorageMetadata,
    /// Authoritative global ledger (opt-in, last resort)
    GlobalLedger,
}

impl Source {
    /// String form used in response metadata and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::ProjectionCache => "projection_cache",
            Source::LedgerMirror => "ledger_mirror",
            Source::ComponentPoll => "component_poll",
            Source::StorageMetadata => "storage_metadata",
            Source::GlobalLedger => "global_ledger",
        }
    }

    /// Base cost weight of answering from this source, in cost units.
    ///
    /// Mirror and storage queries add per-row work on top of this base;
    /// see [`crate::controls::ResponseMetadata::cost_units`].
    pub fn base_cost(&self) -> u32 {
        match self {
            Source::ProjectionCache => 1,
            Source::LedgerMirror => 1,
            Source::ComponentPoll => 5,
            Source::StorageMetadata => 1,
            Source::GlobalLedger => 100,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(Source::ProjectionCache < Source::LedgerMirror);
        assert!(Source::LedgerMirror < Source::ComponentPoll);
        assert!(Source::StorageMetadata < Source::GlobalLedger);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Source::LedgerMirror).unwrap();
        assert_eq!(json, r#""ledger_mirror""#);

        let parsed: Source = serde_json::from_str(r#""projection_cache""#).unwrap();
        assert_eq!(parsed, Source::ProjectionCache);
    }

    #[test]
    fn test_cost_weights() {
        assert_eq!(Source::ProjectionCache.base_cost(), 1);
        assert_eq!(Source::ComponentPoll.base_cost(), 5);
        assert_eq!(Source::GlobalLedger.base_cost(), 100);
    }
}
