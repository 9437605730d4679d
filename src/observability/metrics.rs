//! Versioning counters
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one versioned model, shared by every connection it is bound to
///
/// All counters use Relaxed ordering; exact cross-counter consistency is not
/// needed for reporting.
#[derive(Debug, Default)]
pub struct VersionMetrics {
    /// Version records persisted by any save path
    versions_saved: AtomicU64,
    /// Saves whose content reached the active document
    promotions: AtomicU64,
    /// Saves left as non-active history
    historical_saves: AtomicU64,
    /// Explicit activations
    activations: AtomicU64,
    /// Version records deleted
    versions_deleted: AtomicU64,
    /// Deletions refused because the version was active
    deletes_refused: AtomicU64,
    /// Active documents soft-deleted
    originals_deleted: AtomicU64,
    /// Version token mismatches
    conflicts: AtomicU64,
    /// Speculative writes undone
    compensations: AtomicU64,
    /// Speculative writes that could not be undone
    compensation_failures: AtomicU64,
}

impl VersionMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_versions_saved(&self) {
        self.versions_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_promotions(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_historical_saves(&self) {
        self.historical_saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_activations(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_versions_deleted(&self) {
        self.versions_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes_refused(&self) {
        self.deletes_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_originals_deleted(&self) {
        self.originals_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compensations(&self) {
        self.compensations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compensation_failures(&self) {
        self.compensation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            versions_saved: self.versions_saved.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            historical_saves: self.historical_saves.load(Ordering::Relaxed),
            activations: self.activations.load(Ordering::Relaxed),
            versions_deleted: self.versions_deleted.load(Ordering::Relaxed),
            deletes_refused: self.deletes_refused.load(Ordering::Relaxed),
            originals_deleted: self.originals_deleted.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            compensations: self.compensations.load(Ordering::Relaxed),
            compensation_failures: self.compensation_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub versions_saved: u64,
    pub promotions: u64,
    pub historical_saves: u64,
    pub activations: u64,
    pub versions_deleted: u64,
    pub deletes_refused: u64,
    pub originals_deleted: u64,
    pub conflicts: u64,
    pub compensations: u64,
    pub compensation_failures: u64,
}

impl MetricsSnapshot {
    /// Render as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
