//! Reduce Stock Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::stock::models::{ReducedItem, ReductionContext};

use crate::{
    extensions::*,
    state::State,
    stock::{
        errors::into_status_error,
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RejectedItemBody, RequestMeta, StockItemPayload, after_order},
    },
};

/// Reduce Stock Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReduceStockRequest {
    #[serde(default)]
    pub items: Vec<StockItemPayload>,

    /// Optional caller-supplied idempotency key, threaded through for
    /// logging only
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// A successfully committed decrement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReducedItemBody {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub new_stock: i64,
    pub timestamp: String,
    pub status: String,
}

impl From<ReducedItem> for ReducedItemBody {
    fn from(reduced: ReducedItem) -> Self {
        ReducedItemBody {
            product_id: reduced.item.product_uuid,
            size: reduced.item.size,
            color: reduced.item.color,
            quantity: reduced.item.quantity,
            new_stock: reduced.new_stock,
            timestamp: reduced.reduced_at.to_string(),
            status: "reduced".to_string(),
        }
    }
}

/// Reduce Stock Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReduceStockResponse {
    /// True iff every item committed
    pub success: bool,
    pub results: Vec<ReducedItemBody>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RejectedItemBody>>,

    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Reduce Stock Handler
///
/// Batch decrement. Items commit independently: a failed item is reported
/// in `errors` while the rest of the batch proceeds, so callers must
/// inspect `errors` even on a 200 response. Once committed a decrement is
/// final; there is no compensating action.
#[endpoint(
    tags("stock"),
    summary = "Reduce Stock",
    responses(
        (status_code = StatusCode::OK, description = "Per-item reduction outcome"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing items array"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<ReduceStockRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReduceStockResponse>, StatusError> {
    let meta = RequestMeta::start();
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let after_order = after_order(req);
    let order_id = req.query::<String>("orderId");

    let request = json.into_inner();

    if request.items.is_empty() {
        apply_no_cache_headers(res)?;

        return Err(StatusError::bad_request().brief("items array is required"));
    }

    let ctx = ReductionContext {
        transaction_id: request.transaction_id,
        order_id,
    };

    let outcome = state
        .stock
        .reduce_stock(request.items.into_iter().map(Into::into).collect(), ctx)
        .await
        .map_err(|error| {
            _ = apply_no_cache_headers(res);

            into_status_error(error)
        })?;

    apply_stock_headers(res, after_order)?;

    let success = outcome.is_success();

    let errors = if success {
        None
    } else {
        Some(outcome.rejected.into_iter().map(Into::into).collect())
    };

    Ok(Json(ReduceStockResponse {
        success,
        results: outcome.reduced.into_iter().map(Into::into).collect(),
        errors,
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}
