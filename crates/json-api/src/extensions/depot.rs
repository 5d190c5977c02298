//! Typed extraction from the request depot.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

/// Obtain injected shared state, mapping absence to a 500.
///
/// The stock handlers all pull their shared `State` this way; a missing
/// entry means the server was wired up wrong, not a bad request.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }
}
