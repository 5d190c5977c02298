//! State

use std::sync::Arc;

use stockroom_app::{context::AppContext, events::EventHub, ledger::ChangeLedger, stock::StockService};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) stock: Arc<dyn StockService>,
    pub(crate) ledger: Arc<ChangeLedger>,
    pub(crate) events: Arc<EventHub>,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        stock: Arc<dyn StockService>,
        ledger: Arc<ChangeLedger>,
        events: Arc<EventHub>,
    ) -> Self {
        Self {
            stock,
            ledger,
            events,
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self::new(app.stock, app.ledger, app.events))
    }
}
