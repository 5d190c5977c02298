//! Stock response caching headers.
//!
//! Downstream caches and the storefront decide whether to trust a cached
//! stock value from this pair: `Cache-Control` is fully disabled right
//! after an order (or on error), and `X-Stock-Timestamp` always carries
//! the server clock at response time.

use jiff::Timestamp;
use salvo::{http::header::CACHE_CONTROL, prelude::*};

use crate::extensions::ResultExt;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const SHORT_CACHE: &str = "public, max-age=10";

pub(crate) const STOCK_TIMESTAMP_HEADER: &str = "x-stock-timestamp";

pub(crate) fn apply_stock_headers(
    res: &mut Response,
    after_order: bool,
) -> Result<(), StatusError> {
    let cache_control = if after_order { NO_CACHE } else { SHORT_CACHE };

    res.add_header(CACHE_CONTROL, cache_control, true)
        .or_500("failed to set cache-control header")?
        .add_header(STOCK_TIMESTAMP_HEADER, Timestamp::now().to_string(), true)
        .or_500("failed to set stock timestamp header")?;

    Ok(())
}

pub(crate) fn apply_no_cache_headers(res: &mut Response) -> Result<(), StatusError> {
    apply_stock_headers(res, true)
}
