//! Realtime Event Models

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

/// Named realtime event types, as sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "stock:updated")]
    StockUpdated,

    #[serde(rename = "stock:reduced")]
    StockReduced,

    /// Reserved; not emitted by any current path.
    #[serde(rename = "stock:validated")]
    StockValidated,

    #[serde(rename = "product:updated")]
    ProductUpdated,

    #[serde(rename = "product:deleted")]
    ProductDeleted,
}

impl EventKind {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockUpdated => "stock:updated",
            Self::StockReduced => "stock:reduced",
            Self::StockValidated => "stock:validated",
            Self::ProductUpdated => "product:updated",
            Self::ProductDeleted => "product:deleted",
        }
    }
}

/// A transient broadcast message. Not persisted; a disconnected client
/// receiving nothing is expected to reconcile via a pull sync.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEvent {
    pub event: EventKind,
    pub product_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,

    /// Server clock at broadcast time; stamped by the hub.
    pub timestamp: Timestamp,
}

impl StockEvent {
    #[must_use]
    pub fn reduced(product_id: Uuid, size: String, color: String, stock: i64) -> Self {
        Self::variant_event(EventKind::StockReduced, product_id, size, color, stock)
    }

    #[must_use]
    pub fn updated(product_id: Uuid, size: String, color: String, stock: i64) -> Self {
        Self::variant_event(EventKind::StockUpdated, product_id, size, color, stock)
    }

    fn variant_event(
        event: EventKind,
        product_id: Uuid,
        size: String,
        color: String,
        stock: i64,
    ) -> Self {
        Self {
            event,
            product_id,
            size: Some(size),
            color: Some(color),
            stock: Some(stock),
            timestamp: Timestamp::now(),
        }
    }
}
