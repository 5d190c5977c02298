//! Validate Stock Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::stock::models::ValidItem;

use crate::{
    extensions::*,
    state::State,
    stock::{
        errors::into_status_error,
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RejectedItemBody, RequestMeta, StockItemPayload, after_order},
    },
};

/// Validate Stock Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidateStockRequest {
    #[serde(default)]
    pub items: Vec<StockItemPayload>,
}

/// An accepted item, echoing the available quantity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidItemBody {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub available_stock: i64,
}

impl From<ValidItem> for ValidItemBody {
    fn from(valid: ValidItem) -> Self {
        ValidItemBody {
            product_id: valid.item.product_uuid,
            size: valid.item.size,
            color: valid.item.color,
            quantity: valid.item.quantity,
            available_stock: valid.available,
        }
    }
}

/// Validate Stock Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidateStockResponse {
    /// True iff no item was rejected
    pub valid: bool,
    pub valid_items: Vec<ValidItemBody>,
    pub invalid_items: Vec<RejectedItemBody>,
    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Validate Stock Handler
///
/// Batch availability check. Performs no writes and gives no hold on
/// stock: a concurrent reduction can still consume quantities reported
/// as available here.
#[endpoint(
    tags("stock"),
    summary = "Validate Stock",
    responses(
        (status_code = StatusCode::OK, description = "Per-item validation outcome"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing items array"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<ValidateStockRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ValidateStockResponse>, StatusError> {
    let meta = RequestMeta::start();
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let after_order = after_order(req);

    let items = json.into_inner().items;

    if items.is_empty() {
        apply_no_cache_headers(res)?;

        return Err(StatusError::bad_request().brief("items array is required"));
    }

    let outcome = state
        .stock
        .validate_stock(items.into_iter().map(Into::into).collect())
        .await
        .map_err(|error| {
            _ = apply_no_cache_headers(res);

            into_status_error(error)
        })?;

    apply_stock_headers(res, after_order)?;

    Ok(Json(ValidateStockResponse {
        valid: outcome.is_valid(),
        valid_items: outcome.valid_items.into_iter().map(Into::into).collect(),
        invalid_items: outcome.invalid_items.into_iter().map(Into::into).collect(),
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}
