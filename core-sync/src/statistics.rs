//! # Sync Statistics
//!
//! Lock-free counters shared by every task of one orchestrator, plus
//! serializable snapshots for reporting.
//!
//! Counters only grow. For every settled batch:
//!
//! ```text
//! processed == created + updated + failed + unchanged
//! ```
//!
//! where `unchanged` covers drafts that needed no remote call (up to date,
//! dropped by the before-create hook, or superseded by a duplicate).

use chrono::{DateTime, Utc};
use core_async::time::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use uuid::Uuid;

// ============================================================================
// Session Id
// ============================================================================

/// Identifies one orchestrator instance in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncSessionId(Uuid);

impl SyncSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SyncSessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Counters
// ============================================================================

#[derive(Debug)]
pub struct SyncStatistics {
    session_id: SyncSessionId,
    resource: &'static str,
    started_at: DateTime<Utc>,
    processed: AtomicU64,
    created: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
    batches: AtomicU64,
    /// Milliseconds since the Unix epoch, `i64::MIN` before the first batch
    latest_batch_started_ms: AtomicI64,
    latest_batch_duration_ms: AtomicU64,
}

impl SyncStatistics {
    pub fn new(session_id: SyncSessionId, resource: &'static str) -> Self {
        Self {
            session_id,
            resource,
            started_at: Utc::now(),
            processed: AtomicU64::new(0),
            created: AtomicU64::new(0),
            updated: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            latest_batch_started_ms: AtomicI64::new(i64::MIN),
            latest_batch_duration_ms: AtomicU64::new(0),
        }
    }

    pub fn session_id(&self) -> SyncSessionId {
        self.session_id
    }

    pub fn increment_processed(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::SeqCst);
    }

    pub fn increment_created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_updated(&self) {
        self.updated.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_failed(&self, count: u64) {
        self.failed.fetch_add(count, Ordering::SeqCst);
    }

    /// Mark the start of a batch
    pub fn start_batch(&self) {
        self.latest_batch_started_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    /// Mark the end of a batch that took `elapsed`
    pub fn finish_batch(&self, elapsed: Duration) {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.latest_batch_duration_ms
            .store(elapsed.as_millis() as u64, Ordering::SeqCst);
    }

    /// Consistent-enough view of the counters; safe while batches are running
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let latest_batch_started_at = match self.latest_batch_started_ms.load(Ordering::SeqCst) {
            i64::MIN => None,
            millis => DateTime::from_timestamp_millis(millis),
        };

        StatisticsSnapshot {
            session_id: self.session_id,
            resource: self.resource.to_string(),
            processed: self.processed.load(Ordering::SeqCst),
            created: self.created.load(Ordering::SeqCst),
            updated: self.updated.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            batches: self.batches.load(Ordering::SeqCst),
            started_at: self.started_at,
            latest_batch_started_at,
            latest_batch_duration_ms: self.latest_batch_duration_ms.load(Ordering::SeqCst),
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time copy of [`SyncStatistics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub session_id: SyncSessionId,
    pub resource: String,
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub failed: u64,
    pub batches: u64,
    pub started_at: DateTime<Utc>,
    pub latest_batch_started_at: Option<DateTime<Utc>>,
    pub latest_batch_duration_ms: u64,
}

impl StatisticsSnapshot {
    /// Drafts that were processed without a create, update or failure
    pub fn unchanged(&self) -> u64 {
        self.processed
            .saturating_sub(self.created + self.updated + self.failed)
    }

    /// Compare all four counters at once
    pub fn has_values(&self, processed: u64, created: u64, updated: u64, failed: u64) -> bool {
        self.processed == processed
            && self.created == created
            && self.updated == updated
            && self.failed == failed
    }

    /// One-line human-readable summary
    pub fn report_message(&self) -> String {
        format!(
            "Summary: {} {} were processed in total ({} created, {} updated and {} failed to sync).",
            self.processed, self.resource, self.created, self.updated, self.failed
        )
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report_message())
    }
}
