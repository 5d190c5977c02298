//! Pull Sync Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::stock::models::{ColorStock, ProductStock, SizeStock};

use crate::{
    extensions::*,
    state::State,
    stock::{
        errors::into_status_error,
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RequestMeta, after_order},
    },
};

/// A color variant and its current stock.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ColorStockBody {
    pub color: String,
    pub stock: i64,
}

impl From<ColorStock> for ColorStockBody {
    fn from(color: ColorStock) -> Self {
        ColorStockBody {
            color: color.color,
            stock: color.stock,
        }
    }
}

/// A size variant and its color variants.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SizeStockBody {
    pub size: String,
    pub colors: Vec<ColorStockBody>,
}

impl From<SizeStock> for SizeStockBody {
    fn from(size: SizeStock) -> Self {
        SizeStockBody {
            size: size.size,
            colors: size.colors.into_iter().map(Into::into).collect(),
        }
    }
}

/// The authoritative stock view of one product.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductStockBody {
    pub product_id: Uuid,
    pub title: String,
    pub sizes: Vec<SizeStockBody>,
    /// Always recomputed from the variants; the flat legacy count is used
    /// only for products with no variants
    pub total_stock: i64,
    pub last_updated: String,
}

impl From<ProductStock> for ProductStockBody {
    fn from(product: ProductStock) -> Self {
        let total_stock = product.total_stock();

        ProductStockBody {
            product_id: product.product_uuid,
            title: product.title,
            sizes: product.sizes.into_iter().map(Into::into).collect(),
            total_stock,
            last_updated: product.updated_at.to_string(),
        }
    }
}

/// Pull Sync Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PullSyncResponse {
    pub products: Vec<ProductStockBody>,

    /// Requested ids that did not resolve to an existing product
    pub missing_product_ids: Vec<String>,

    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Pull Sync Handler
///
/// Returns the authoritative stock state for a comma-separated set of
/// product ids so clients can reconcile local caches. Ids that do not
/// resolve are reported as data, not as an error.
#[endpoint(
    tags("stock"),
    summary = "Pull Stock Sync",
    responses(
        (status_code = StatusCode::OK, description = "Current stock for the requested products"),
        (status_code = StatusCode::BAD_REQUEST, description = "No product ids supplied"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PullSyncResponse>, StatusError> {
    let meta = RequestMeta::start();
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let after_order = after_order(req);

    let product_ids: Vec<String> = req
        .query::<String>("productIds")
        .unwrap_or_default()
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if product_ids.is_empty() {
        apply_no_cache_headers(res)?;

        return Err(StatusError::bad_request().brief("productIds query parameter is required"));
    }

    // Client clock, for diagnosing stale-cache reports.
    if let Some(client_timestamp) = req.query::<String>("timestamp") {
        tracing::debug!(client_timestamp, request_id = %meta.request_id, "pull sync");
    }

    let snapshot = state
        .stock
        .pull_stock(product_ids)
        .await
        .map_err(|error| {
            _ = apply_no_cache_headers(res);

            into_status_error(error)
        })?;

    apply_stock_headers(res, after_order)?;

    Ok(Json(PullSyncResponse {
        products: snapshot.products.into_iter().map(Into::into).collect(),
        missing_product_ids: snapshot.missing_product_ids,
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}
