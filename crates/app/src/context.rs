//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    events::EventHub,
    ledger::ChangeLedger,
    stock::{PgStockService, StockService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub stock: Arc<dyn StockService>,
    pub ledger: Arc<ChangeLedger>,
    pub events: Arc<EventHub>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);
        let ledger = Arc::new(ChangeLedger::new());
        let events = Arc::new(EventHub::new());

        Ok(Self {
            stock: Arc::new(PgStockService::new(
                db,
                Arc::clone(&ledger),
                Arc::clone(&events),
            )),
            ledger,
            events,
        })
    }
}
