//! Change ledger service.
//!
//! Bounded, append-only record of recent product mutations plus the
//! cache-status map dependent aggregates use to decide when to refetch.
//! Records are only ever aged out by capacity, never deleted explicitly.

use std::sync::{Mutex, PoisonError};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::ledger::models::{
    CacheStatus, ChangeKind, ChangeRecord, DASHBOARD_STATS_KEY, PRODUCT_COUNTS_CAPACITY,
    PRODUCT_COUNTS_KEY, RECENT_CHANGES_CAPACITY,
};

/// Fixed-capacity circular buffer of change records.
#[derive(Debug)]
struct RingLog {
    entries: Vec<ChangeRecord>,
    cursor: usize,
    capacity: usize,
}

impl RingLog {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    fn push(&mut self, record: ChangeRecord) {
        if self.entries.len() < self.capacity {
            self.entries.push(record);
        } else if let Some(slot) = self.entries.get_mut(self.cursor) {
            *slot = record;
        }

        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Snapshot in reverse-chronological order.
    fn newest_first(&self) -> Vec<ChangeRecord> {
        let mut records = Vec::with_capacity(self.entries.len());

        // The cursor points at the oldest entry once the buffer is full.
        for offset in 1..=self.entries.len() {
            let index = (self.cursor + self.entries.len() - offset) % self.entries.len();

            if let Some(record) = self.entries.get(index) {
                records.push(record.clone());
            }
        }

        records
    }
}

#[derive(Debug)]
struct LedgerInner {
    product_counts: RingLog,
    recent_changes: RingLog,
    caches: FxHashMap<String, CacheStatus>,
}

/// In-process change ledger and cache invalidation log.
#[derive(Debug)]
pub struct ChangeLedger {
    inner: Mutex<LedgerInner>,
}

impl Default for ChangeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                product_counts: RingLog::new(PRODUCT_COUNTS_CAPACITY),
                recent_changes: RingLog::new(RECENT_CHANGES_CAPACITY),
                caches: FxHashMap::default(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a change record to both bounded logs and mark every
    /// dependent aggregate cache as stale.
    pub fn record_change(&self, kind: ChangeKind, product_uuid: Uuid, detail: serde_json::Value) {
        let record = ChangeRecord {
            kind,
            product_uuid,
            recorded_at: Timestamp::now(),
            detail,
        };

        let mut inner = self.lock();

        inner.product_counts.push(record.clone());
        inner.recent_changes.push(record);

        let now = Timestamp::now();

        for key in [PRODUCT_COUNTS_KEY, DASHBOARD_STATS_KEY] {
            let status = inner.caches.entry(key.to_string()).or_default();

            status.requires_refresh = true;
            status.last_invalidated = Some(now);
        }
    }

    /// The global recent-changes log, newest first, optionally filtered to
    /// records newer than `since`.
    #[must_use]
    pub fn recent_changes(&self, since: Option<Timestamp>) -> Vec<ChangeRecord> {
        let records = self.lock().recent_changes.newest_first();

        match since {
            Some(since) => records
                .into_iter()
                .filter(|record| record.recorded_at > since)
                .collect(),
            None => records,
        }
    }

    /// The per-key product-counts log, newest first.
    #[must_use]
    pub fn product_count_changes(&self) -> Vec<ChangeRecord> {
        self.lock().product_counts.newest_first()
    }

    /// Current status for a cache key. Keys never invalidated report a
    /// default (no refresh required) status.
    #[must_use]
    pub fn check_cache(&self, key: &str) -> CacheStatus {
        self.lock().caches.get(key).copied().unwrap_or_default()
    }

    /// Clear the refresh flag after a reader has recomputed its aggregate.
    ///
    /// This is a cooperative handshake, not a lock: two concurrent readers
    /// may both refresh, which is acceptable because recomputation is
    /// idempotent.
    pub fn mark_refreshed(&self, key: &str) {
        let mut inner = self.lock();
        let status = inner.caches.entry(key.to_string()).or_default();

        status.requires_refresh = false;
        status.last_refreshed = Some(Timestamp::now());
    }
}
