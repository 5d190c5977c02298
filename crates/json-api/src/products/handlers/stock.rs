//! Product Stock Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    extensions::*,
    state::State,
    stock::{
        errors::into_status_error,
        handlers::sync_pull::SizeStockBody,
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RequestMeta, after_order},
    },
};

/// Product Stock Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductStockResponse {
    pub product_id: Uuid,
    pub title: String,
    pub variants: Vec<SizeStockBody>,
    /// Sum of all color-variant stock, falling back to the legacy flat
    /// count only for products with no variants
    pub total_stock: i64,
    pub last_updated: String,
    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Product Stock Handler
///
/// Snapshot of a single product's stock tree.
#[endpoint(
    tags("products"),
    summary = "Product Stock",
    responses(
        (status_code = StatusCode::OK, description = "Current product stock"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductStockResponse>, StatusError> {
    let meta = RequestMeta::start();
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let after_order = after_order(req);

    let stock = state
        .stock
        .product_stock(product.into_inner())
        .await
        .map_err(|error| {
            _ = apply_no_cache_headers(res);

            into_status_error(error)
        })?;

    apply_stock_headers(res, after_order)?;

    let total_stock = stock.total_stock();

    Ok(Json(ProductStockResponse {
        product_id: stock.product_uuid,
        title: stock.title,
        variants: stock.sizes.into_iter().map(Into::into).collect(),
        total_stock,
        last_updated: stock.updated_at.to_string(),
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}
