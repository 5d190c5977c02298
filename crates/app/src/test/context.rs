//! Test context for service-level integration tests.

use std::sync::Arc;

use crate::{
    database::Db, events::EventHub, ledger::ChangeLedger, stock::PgStockService,
};

use super::db::TestDb;

/// A stock service wired to an isolated test database, with real ledger
/// and event hub instances so their side effects can be asserted.
pub(crate) struct TestContext {
    pub db: TestDb,
    pub stock: PgStockService,
    pub ledger: Arc<ChangeLedger>,
    pub events: Arc<EventHub>,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = TestDb::new().await;
        let ledger = Arc::new(ChangeLedger::new());
        let events = Arc::new(EventHub::new());

        let stock = PgStockService::new(
            Db::new(db.pool().clone()),
            Arc::clone(&ledger),
            Arc::clone(&events),
        );

        Self {
            db,
            stock,
            ledger,
            events,
        }
    }
}
