//! Stock Errors

use salvo::http::StatusError;
use tracing::error;

use stockroom_app::stock::StockServiceError;

pub(crate) fn into_status_error(error: StockServiceError) -> StatusError {
    match error {
        StockServiceError::InvalidReference
        | StockServiceError::MissingRequiredData
        | StockServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid stock payload")
        }
        StockServiceError::Sql(source) => {
            error!("stock operation failed: {source}");

            StatusError::internal_server_error()
        }
        StockServiceError::NotFound => StatusError::not_found().brief("Product not found"),
    }
}
