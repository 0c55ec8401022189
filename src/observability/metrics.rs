//! Resolution counters
//!
//! - Counters only, monotonic
//! - Thread-safe without locks

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing how histories were resolved.
///
/// All counters use Relaxed ordering; readers only need eventually exact
/// totals.
#[derive(Debug, Default)]
pub struct HistoryMetrics {
    /// Resolutions driven by the node-to-revisions index
    indexed_resolutions: AtomicU64,
    /// Resolutions that walked the previous-revision chain
    fallback_resolutions: AtomicU64,
    /// Read-only transactions opened for probing
    transactions_opened: AtomicU64,
    /// Probes that did not find the node
    probe_misses: AtomicU64,
    /// Listed revisions that did not contain the node
    index_skews: AtomicU64,
    /// Entries returned to callers
    entries_returned: AtomicU64,
    /// Resolutions that ended in an error
    failures: AtomicU64,
}

impl HistoryMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment indexed resolutions
    pub fn increment_indexed_resolutions(&self) {
        self.indexed_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment fallback resolutions
    pub fn increment_fallback_resolutions(&self) {
        self.fallback_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment opened transactions
    pub fn increment_transactions_opened(&self) {
        self.transactions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment probe misses
    pub fn increment_probe_misses(&self) {
        self.probe_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment index skews
    pub fn increment_index_skews(&self) {
        self.index_skews.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the returned entry count
    pub fn add_entries_returned(&self, count: u64) {
        self.entries_returned.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment failures
    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as one JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            indexed_resolutions: self.indexed_resolutions.load(Ordering::Relaxed),
            fallback_resolutions: self.fallback_resolutions.load(Ordering::Relaxed),
            transactions_opened: self.transactions_opened.load(Ordering::Relaxed),
            probe_misses: self.probe_misses.load(Ordering::Relaxed),
            index_skews: self.index_skews.load(Ordering::Relaxed),
            entries_returned: self.entries_returned.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub indexed_resolutions: u64,
    pub fallback_resolutions: u64,
    pub transactions_opened: u64,
    pub probe_misses: u64,
    pub index_skews: u64,
    pub entries_returned: u64,
    pub failures: u64,
}
