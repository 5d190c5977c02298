//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};

use stockroom_app::{events::EventHub, ledger::ChangeLedger, stock::MockStockService};

use crate::state::State;

/// State backed by a mocked stock service and real ledger/hub instances.
pub(crate) fn state_with_stock(stock: MockStockService) -> Arc<State> {
    Arc::new(State::new(
        Arc::new(stock),
        Arc::new(ChangeLedger::new()),
        Arc::new(EventHub::new()),
    ))
}

pub(crate) fn stock_service_with_state(state: Arc<State>, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(state)).push(route))
}

pub(crate) fn stock_service(stock: MockStockService, route: Router) -> Service {
    stock_service_with_state(state_with_stock(stock), route)
}
