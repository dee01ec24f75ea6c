//! Request controls and response metadata

use crate::source::Source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Freshness preference for a query.
///
/// Trades cached staleness against live-query cost and latency. Operations
/// without a fresh branch (status, get-receipt, diagnostics) ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Cache first, fall back on miss (default)
    #[default]
    CacheOk,
    /// Mirror first, fall back to cache on failure
    PreferFresh,
    /// Mirror only; cache bypassed entirely
    ForceFresh,
}

/// Caller-supplied bounds on a query.
///
/// All fields are requests, not guarantees: the engine clamps the effective
/// limit and time window into policy-safe values regardless of what the
/// caller asks for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestControls {
    /// Maximum results requested; absent or zero means the configured default
    pub limit: Option<u32>,
    /// Absolute lower time bound; clamped to the maximum window
    pub since: Option<DateTime<Utc>>,
    /// Relative time window in hours, used when `since` is absent
    pub time_window_hours: Option<u32>,
    /// Freshness preference
    #[serde(default)]
    pub freshness: Freshness,
}

/// Attribution and cost metadata attached to every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// The source that actually produced the returned data (not every
    /// source attempted)
    pub source: Source,
    /// Age of the returned data in milliseconds; 0 for a live query
    pub freshness_age_ms: u64,
    /// Whether results hit the effective limit
    #[serde(default)]
    pub truncated: bool,
    /// Opaque pagination token, when more results are available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Source-weighted proxy for the work performed answering the query
    pub cost_units: u32,
}

impl ResponseMetadata {
    /// Metadata for a response answered from a live (age zero) source at
    /// its base cost.
    pub fn live(source: Source) -> Self {
        Self {
            source,
            freshness_age_ms: 0,
            truncated: false,
            next_page_token: None,
            cost_units: source.base_cost(),
        }
    }

    /// Metadata for a cache-served response with a known entry age.
    pub fn cached(age_ms: u64) -> Self {
        Self {
            source: Source::ProjectionCache,
            freshness_age_ms: age_ms,
            truncated: false,
            next_page_token: None,
            cost_units: Source::ProjectionCache.base_cost(),
        }
    }
}
