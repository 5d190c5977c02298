//! App Router

use salvo::Router;

use crate::{products, realtime, stock};

pub(crate) fn app_router() -> Router {
    Router::new()
        .push(
            Router::with_path("stock")
                .push(Router::with_path("validate").post(stock::handlers::validate::handler))
                .push(Router::with_path("reduce").post(stock::handlers::reduce::handler))
                .push(
                    Router::with_path("sync")
                        .get(stock::handlers::sync_pull::handler)
                        .post(stock::handlers::sync_push::handler),
                )
                .push(Router::with_path("changes").get(stock::handlers::changes::handler))
                .push(Router::with_path("events").goal(realtime::handler)),
        )
        .push(
            Router::with_path("products").push(
                Router::with_path("{product}")
                    .push(Router::with_path("stock").get(products::handlers::stock::handler)),
            ),
        )
}
