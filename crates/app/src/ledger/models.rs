//! Change Ledger Models

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cache key for the per-product counts aggregate.
pub const PRODUCT_COUNTS_KEY: &str = "product_counts";

/// Cache key for the dashboard stats aggregate.
pub const DASHBOARD_STATS_KEY: &str = "dashboard_stats";

/// Capacity of the product-counts change log.
pub const PRODUCT_COUNTS_CAPACITY: usize = 20;

/// Capacity of the global recent-changes log.
pub const RECENT_CHANGES_CAPACITY: usize = 50;

/// The kind of mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
}

impl ChangeKind {
    /// Wire name of the change kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One recorded product mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub product_uuid: Uuid,
    pub recorded_at: Timestamp,
    /// Free-form detail payload supplied by the mutating operation.
    pub detail: serde_json::Value,
}

/// Invalidate/reconcile state for one logical cache key.
///
/// Created on first invalidation, mutated by every invalidate or
/// mark-refreshed call, never deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub last_invalidated: Option<Timestamp>,
    pub requires_refresh: bool,
    pub last_refreshed: Option<Timestamp>,
}
