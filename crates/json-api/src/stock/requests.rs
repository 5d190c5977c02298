//! Shared stock request/response plumbing.

use std::time::Instant;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::stock::models::{RejectedItem, StockItemInput};

/// One batch item as supplied by the client. All fields are optional so
/// malformed items are rejected individually rather than failing the
/// whole request body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StockItemPayload {
    /// Product UUID as a string
    #[serde(default)]
    pub product_id: Option<String>,

    /// Size variant label
    #[serde(default)]
    pub size: Option<String>,

    /// Color variant label
    #[serde(default)]
    pub color: Option<String>,

    /// Requested quantity (omitted on sync-push items)
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl From<StockItemPayload> for StockItemInput {
    fn from(payload: StockItemPayload) -> Self {
        StockItemInput {
            product_id: payload.product_id,
            size: payload.size,
            color: payload.color,
            quantity: payload.quantity,
        }
    }
}

/// A rejected batch item with its human-readable reason.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RejectedItemBody {
    pub product_id: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub reason: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_quantity: Option<i64>,
}

impl From<RejectedItem> for RejectedItemBody {
    fn from(rejected: RejectedItem) -> Self {
        use stockroom_app::stock::models::RejectReason;

        let reason = rejected.reason.message();

        let (available_stock, requested_quantity) = match rejected.reason {
            RejectReason::InsufficientStock {
                available,
                requested,
            } => (Some(available), Some(requested)),
            _ => (None, None),
        };

        RejectedItemBody {
            product_id: rejected.input.product_id,
            size: rejected.input.size,
            color: rejected.input.color,
            reason,
            available_stock,
            requested_quantity,
        }
    }
}

/// Per-request diagnostics attached to every stock response.
#[derive(Debug)]
pub(crate) struct RequestMeta {
    started: Instant,
    pub request_id: Uuid,
}

impl RequestMeta {
    pub(crate) fn start() -> Self {
        Self {
            started: Instant::now(),
            request_id: Uuid::new_v4(),
        }
    }

    /// Elapsed handler time in milliseconds.
    pub(crate) fn processing_time(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Server clock for the response body.
    pub(crate) fn timestamp() -> String {
        Timestamp::now().to_string()
    }
}

/// Whether the request was flagged as running right after an order, which
/// forces downstream caches to refetch.
pub(crate) fn after_order(req: &Request) -> bool {
    req.queries()
        .get("afterOrder")
        .is_some_and(|value| value.is_empty() || value == "true" || value == "1")
}
