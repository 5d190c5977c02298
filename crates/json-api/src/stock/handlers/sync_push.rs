//! Push Sync Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::stock::models::TouchedItem;

use crate::{
    extensions::*,
    state::State,
    stock::{
        errors::into_status_error,
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RejectedItemBody, RequestMeta, StockItemPayload, after_order},
    },
};

/// Push Sync Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PushSyncRequest {
    #[serde(default)]
    pub items: Vec<StockItemPayload>,
}

/// A touched variant, carrying the store's current stock count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TouchedItemBody {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    /// The authoritative stock value, never a client-supplied one
    pub stock: i64,
    pub timestamp: String,
}

impl From<TouchedItem> for TouchedItemBody {
    fn from(touched: TouchedItem) -> Self {
        TouchedItemBody {
            product_id: touched.item.product_uuid,
            size: touched.item.size,
            color: touched.item.color,
            stock: touched.stock,
            timestamp: touched.touched_at.to_string(),
        }
    }
}

/// Push Sync Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PushSyncResponse {
    /// True iff every item was touched
    pub success: bool,
    pub results: Vec<TouchedItemBody>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RejectedItemBody>>,

    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Push Sync Handler
///
/// Touch-and-notify: stamps each observed variant's product and
/// broadcasts the variant's current stock so clients showing stale state
/// reconcile. A client can never set a stock number through this path.
#[endpoint(
    tags("stock"),
    summary = "Push Stock Sync",
    responses(
        (status_code = StatusCode::OK, description = "Per-item touch outcome"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing items array"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<PushSyncRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PushSyncResponse>, StatusError> {
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
        .push_stock(items.into_iter().map(Into::into).collect())
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

    Ok(Json(PushSyncResponse {
        success,
        results: outcome.touched.into_iter().map(Into::into).collect(),
        errors,
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;
    use uuid::Uuid;

    use stockroom_app::stock::{
        MockStockService,
        models::{PushOutcome, RejectReason, RejectedItem, StockItemInput, TouchItem},
    };

    use crate::test_helpers::stock_service;

    use super::*;

    fn make_service(stock: MockStockService) -> Service {
        stock_service(stock, Router::with_path("stock/sync").post(handler))
    }

    #[tokio::test]
    async fn test_push_touches_variant_and_reports_current_stock() -> TestResult {
        let uuid = Uuid::new_v4();
        let mut stock = MockStockService::new();

        let outcome = PushOutcome {
            touched: vec![TouchedItem {
                item: TouchItem {
                    product_uuid: uuid,
                    size: "M".to_string(),
                    color: "Red".to_string(),
                },
                stock: 7,
                touched_at: Timestamp::UNIX_EPOCH,
            }],
            rejected: Vec::new(),
        };

        stock
            .expect_push_stock()
            .once()
            .withf(|items| items.len() == 1 && items[0].quantity.is_none())
            .return_once(move |_| Ok(outcome));

        let mut res = TestClient::post("http://example.com/stock/sync")
            .json(&json!({
                "items": [{ "productId": uuid, "size": "M", "color": "Red" }]
            }))
            .send(&make_service(stock))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: PushSyncResponse = res.take_json().await?;

        assert!(body.success);
        assert_eq!(body.results.len(), 1);
        // The response echoes the store's stock, not anything the client sent.
        assert_eq!(body.results[0].stock, 7);

        Ok(())
    }

    #[tokio::test]
    async fn test_push_unknown_variant_is_reported_per_item() -> TestResult {
        let uuid = Uuid::new_v4();
        let mut stock = MockStockService::new();

        let outcome = PushOutcome {
            touched: Vec::new(),
            rejected: vec![RejectedItem {
                input: StockItemInput {
                    product_id: Some(uuid.to_string()),
                    size: Some("XL".to_string()),
                    color: Some("Red".to_string()),
                    quantity: None,
                },
                reason: RejectReason::SizeVariantNotFound,
            }],
        };

        stock
            .expect_push_stock()
            .once()
            .return_once(move |_| Ok(outcome));

        let mut res = TestClient::post("http://example.com/stock/sync")
            .json(&json!({
                "items": [{ "productId": uuid, "size": "XL", "color": "Red" }]
            }))
            .send(&make_service(stock))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: PushSyncResponse = res.take_json().await?;
        let errors = body.errors.unwrap_or_default();

        assert!(!body.success);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, "Size variant not found");

        Ok(())
    }

    #[tokio::test]
    async fn test_push_empty_items_returns_400() -> TestResult {
        let mut stock = MockStockService::new();

        stock.expect_push_stock().never();

        let res = TestClient::post("http://example.com/stock/sync")
            .json(&json!({ "items": [] }))
            .send(&make_service(stock))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
