//! Projection cache: process-local, read-optimized store
//!
//! Holds derived status summaries, receipt-header lists, and full receipts,
//! each stamped with its write time. Reads are age-checked against the
//! configured TTL and expired entries are evicted lazily on read; there is
//! no background sweeper. Writes are whole-entry last-write-wins.

use chrono::{DateTime, Utc};
use spyglass_domain::{FullReceipt, ReceiptHeader, Source, StatusSummary};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// (tenant_id, root_task_id) or (tenant_id, receipt_id)
type Key = (String, String);

struct Entry<T> {
    value: T,
    cached_at: Instant,
}

/// Process-local projection cache. The preferred source for every read
/// operation.
///
/// The cache exclusively owns its entries and is the only writer. Locks
/// guard only the in-memory maps; no lock is held across I/O.
pub struct ProjectionCache {
    ttl: Duration,
    status: Mutex<HashMap<Key, Entry<StatusSummary>>>,
    headers: Mutex<HashMap<Key, Entry<Vec<ReceiptHeader>>>>,
    receipts: Mutex<HashMap<Key, Entry<FullReceipt>>>,
}

impl ProjectionCache {
    /// Capability tag for response attribution
    pub const SOURCE: Source = Source::ProjectionCache;

    /// Create a cache whose entries expire `ttl` after being written.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            status: Mutex::new(HashMap::new()),
            headers: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }

    /// Read a fresh entry, evicting it if its age has reached the TTL.
    /// The age check is all-or-nothing per entry.
    fn read_fresh<T: Clone>(
        &self,
        map: &Mutex<HashMap<Key, Entry<T>>>,
        key: &Key,
    ) -> Option<(T, u64)> {
        let mut map = map.lock().unwrap();
        if let Some(entry) = map.get(key) {
            let age = entry.cached_at.elapsed();
            if age < self.ttl {
                return Some((entry.value.clone(), age.as_millis() as u64));
            }
            debug!(tenant_id = %key.0, key = %key.1, "evicting expired cache entry");
            map.remove(key);
        }
        None
    }

    fn write<T>(&self, map: &Mutex<HashMap<Key, Entry<T>>>, key: Key, value: T) {
        map.lock().unwrap().insert(
            key,
            Entry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Cached status summary for a lineage, with its age in milliseconds.
    pub fn get_status(&self, tenant_id: &str, root_task_id: &str) -> Option<(StatusSummary, u64)> {
        let key = (tenant_id.to_string(), root_task_id.to_string());
        self.read_fresh(&self.status, &key)
    }

    /// Cache a status summary, replacing any existing entry for the lineage.
    pub fn cache_status(&self, status: StatusSummary) {
        let key = (status.tenant_id.clone(), status.root_task_id.clone());
        self.write(&self.status, key, status);
    }

    /// Search cached receipt headers for a lineage.
    ///
    /// Applies phase/recipient filters and the `since` cutoff, orders by
    /// `created_at` descending (absent timestamps sort earliest and so fall
    /// below any cutoff), and truncates to `limit`. The reported age is the
    /// true age of the cached header list.
    pub fn search_receipt_headers(
        &self,
        tenant_id: &str,
        root_task_id: &str,
        phase: Option<&str>,
        recipient_ai: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> (Vec<ReceiptHeader>, u64) {
        let key = (tenant_id.to_string(), root_task_id.to_string());
        let Some((headers, age_ms)) = self.read_fresh(&self.headers, &key) else {
            return (Vec::new(), 0);
        };

        let sort_ts = |h: &ReceiptHeader| h.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut headers: Vec<ReceiptHeader> = headers
            .into_iter()
            .filter(|h| phase.is_none_or(|p| h.phase == p))
            .filter(|h| recipient_ai.is_none_or(|r| h.recipient_ai.as_deref() == Some(r)))
            .filter(|h| sort_ts(h) >= since)
            .collect();

        headers.sort_by(|a, b| sort_ts(b).cmp(&sort_ts(a)));
        headers.truncate(limit);

        (headers, age_ms)
    }

    /// Replace the cached header list for a lineage.
    ///
    /// Write boundary for the projection feed; search operations never
    /// write through this.
    pub fn cache_headers(&self, tenant_id: &str, root_task_id: &str, headers: Vec<ReceiptHeader>) {
        let key = (tenant_id.to_string(), root_task_id.to_string());
        self.write(&self.headers, key, headers);
    }

    /// Cached full receipt by id, with its age in milliseconds.
    pub fn get_receipt(&self, tenant_id: &str, receipt_id: &str) -> Option<(FullReceipt, u64)> {
        let key = (tenant_id.to_string(), receipt_id.to_string());
        self.read_fresh(&self.receipts, &key)
    }

    /// Cache a full receipt, replacing any existing entry for its id.
    pub fn cache_receipt(&self, receipt: FullReceipt) {
        let key = (receipt.tenant_id.clone(), receipt.receipt_id.clone());
        self.write(&self.receipts, key, receipt);
    }

    /// Number of cached header lists (test observability).
    pub fn header_entry_count(&self) -> usize {
        self.headers.lock().unwrap().len()
    }
}
