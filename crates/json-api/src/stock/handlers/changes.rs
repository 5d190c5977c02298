//! Recent Changes Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockroom_app::ledger::ChangeRecord;

use crate::{
    extensions::*,
    state::State,
    stock::{
        headers::{apply_no_cache_headers, apply_stock_headers},
        requests::{RequestMeta, after_order},
    },
};

/// One recorded product mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangeRecordBody {
    /// Change type: add, update or delete
    #[serde(rename = "type")]
    pub kind: String,
    pub product_id: Uuid,
    pub timestamp: String,
    pub detail: serde_json::Value,
}

impl From<ChangeRecord> for ChangeRecordBody {
    fn from(record: ChangeRecord) -> Self {
        ChangeRecordBody {
            kind: record.kind.as_str().to_string(),
            product_id: record.product_uuid,
            timestamp: record.recorded_at.to_string(),
            detail: record.detail,
        }
    }
}

/// Recent Changes Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecentChangesResponse {
    /// Most recent changes, newest first
    pub changes: Vec<ChangeRecordBody>,
    pub timestamp: String,
    /// Handler processing time in milliseconds
    pub processing_time: u64,
    pub request_id: Uuid,
}

/// Recent Changes Handler
///
/// The bounded global change log, used by dependent read-paths to decide
/// when to refetch their aggregates. Optionally filtered to entries newer
/// than the `since` timestamp.
#[endpoint(
    tags("stock"),
    summary = "Recent Stock Changes",
    responses(
        (status_code = StatusCode::OK, description = "Recent change records"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed since timestamp"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<RecentChangesResponse>, StatusError> {
    let meta = RequestMeta::start();
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let after_order = after_order(req);

    let since = match req.query::<String>("since") {
        Some(raw) => match raw.parse::<Timestamp>() {
            Ok(since) => Some(since),
            Err(_) => {
                apply_no_cache_headers(res)?;

                return Err(StatusError::bad_request().brief("Invalid since timestamp"));
            }
        },
        None => None,
    };

    let changes = state.ledger.recent_changes(since);

    apply_stock_headers(res, after_order)?;

    Ok(Json(RecentChangesResponse {
        changes: changes.into_iter().map(Into::into).collect(),
        timestamp: RequestMeta::timestamp(),
        processing_time: meta.processing_time(),
        request_id: meta.request_id,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;
    use uuid::Uuid;

    use stockroom_app::{ledger::ChangeKind, stock::MockStockService};

    use crate::test_helpers::{state_with_stock, stock_service_with_state};

    use super::*;

    #[tokio::test]
    async fn test_changes_returns_recorded_changes_newest_first() -> TestResult {
        let state = state_with_stock(MockStockService::new());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        state
            .ledger
            .record_change(ChangeKind::Add, first, json!({ "title": "Shirt" }));
        state
            .ledger
            .record_change(ChangeKind::Update, second, json!({ "newStock": 4 }));

        let service = stock_service_with_state(
            Arc::clone(&state),
            Router::with_path("stock/changes").get(handler),
        );

        let mut res = TestClient::get("http://example.com/stock/changes")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: RecentChangesResponse = res.take_json().await?;

        assert_eq!(body.changes.len(), 2);
        assert_eq!(body.changes[0].product_id, second);
        assert_eq!(body.changes[0].kind, "update");
        assert_eq!(body.changes[1].product_id, first);

        Ok(())
    }

    #[tokio::test]
    async fn test_changes_rejects_malformed_since() -> TestResult {
        let state = state_with_stock(MockStockService::new());

        let service = stock_service_with_state(
            state,
            Router::with_path("stock/changes").get(handler),
        );

        let res = TestClient::get("http://example.com/stock/changes?since=yesterday")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        // Error responses are never cacheable.
        let cache_control = res
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok());

        assert_eq!(cache_control, Some("no-cache, no-store, must-revalidate"));

        Ok(())
    }

    #[tokio::test]
    async fn test_changes_empty_ledger_returns_empty_list() -> TestResult {
        let state = state_with_stock(MockStockService::new());

        let service = stock_service_with_state(
            state,
            Router::with_path("stock/changes").get(handler),
        );

        let mut res = TestClient::get("http://example.com/stock/changes")
            .send(&service)
            .await;

        let body: RecentChangesResponse = res.take_json().await?;

        assert!(body.changes.is_empty());

        Ok(())
    }
}
