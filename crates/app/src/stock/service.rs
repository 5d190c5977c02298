//! Stock service.
//!
//! Implements the validate / reduce / sync pipeline. Batch operations
//! process items independently: one item's failure is recorded and the
//! rest of the batch continues, and there is no cross-item transaction.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    events::{EventHub, StockEvent},
    ledger::{ChangeKind, ChangeLedger},
    stock::{
        errors::StockServiceError,
        models::{
            ProductStock, PushOutcome, ReducedItem, ReductionContext, ReductionOutcome,
            RejectReason, RejectedItem, StockItem, StockItemInput, SyncSnapshot, TouchItem,
            TouchedItem, ValidItem, ValidationOutcome,
        },
        repository::PgStockRepository,
    },
};

#[derive(Clone)]
pub struct PgStockService {
    db: Db,
    repository: PgStockRepository,
    ledger: Arc<ChangeLedger>,
    events: Arc<EventHub>,
}

impl PgStockService {
    #[must_use]
    pub fn new(db: Db, ledger: Arc<ChangeLedger>, events: Arc<EventHub>) -> Self {
        Self {
            db,
            repository: PgStockRepository::new(),
            ledger,
            events,
        }
    }

    /// Stepwise product / size / color lookup, reporting the first missing
    /// level, or the variant's current stock when all three resolve.
    async fn locate_variant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &TouchItem,
    ) -> Result<Result<i64, RejectReason>, sqlx::Error> {
        if self
            .repository
            .get_product(tx, item.product_uuid)
            .await?
            .is_none()
        {
            return Ok(Err(RejectReason::ProductNotFound));
        }

        if !self
            .repository
            .size_variant_exists(tx, item.product_uuid, &item.size)
            .await?
        {
            return Ok(Err(RejectReason::SizeVariantNotFound));
        }

        let Some(stock) = self
            .repository
            .find_color_stock(tx, item.product_uuid, &item.size, &item.color)
            .await?
        else {
            return Ok(Err(RejectReason::ColorVariantNotFound));
        };

        Ok(Ok(stock))
    }

    async fn classify(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &StockItem,
    ) -> Result<Result<i64, RejectReason>, sqlx::Error> {
        let touch = TouchItem {
            product_uuid: item.product_uuid,
            size: item.size.clone(),
            color: item.color.clone(),
        };

        let available = match self.locate_variant(tx, &touch).await? {
            Ok(available) => available,
            Err(reason) => return Ok(Err(reason)),
        };

        if available < item.quantity {
            return Ok(Err(RejectReason::InsufficientStock {
                available,
                requested: item.quantity,
            }));
        }

        Ok(Ok(available))
    }

    /// Broadcast delivery is strictly best-effort: a missing transport must
    /// never fail the operation that triggered the event.
    fn notify(&self, event: StockEvent) {
        if !self.events.broadcast(event) {
            debug!("no realtime subscribers connected, event dropped");
        }
    }
}

#[async_trait]
impl StockService for PgStockService {
    async fn validate_stock(
        &self,
        items: Vec<StockItemInput>,
    ) -> Result<ValidationOutcome, StockServiceError> {
        let mut tx = self.db.begin_transaction().await?;
        let mut outcome = ValidationOutcome::default();

        for input in items {
            let item = match input.parse() {
                Ok(item) => item,
                Err(reason) => {
                    outcome.invalid_items.push(RejectedItem { input, reason });
                    continue;
                }
            };

            match self.classify(&mut tx, &item).await? {
                Ok(available) => outcome.valid_items.push(ValidItem { item, available }),
                Err(reason) => outcome.invalid_items.push(RejectedItem { input, reason }),
            }
        }

        tx.commit().await?;

        Ok(outcome)
    }

    async fn reduce_stock(
        &self,
        items: Vec<StockItemInput>,
        ctx: ReductionContext,
    ) -> Result<ReductionOutcome, StockServiceError> {
        let mut outcome = ReductionOutcome::default();

        for input in items {
            let item = match input.parse() {
                Ok(item) => item,
                Err(reason) => {
                    outcome.rejected.push(RejectedItem { input, reason });
                    continue;
                }
            };

            // One transaction per item so a failed item never rolls back a
            // committed one.
            let mut tx = self.db.begin_transaction().await?;

            let Some(new_stock) = self.repository.reduce_stock(&mut tx, &item).await? else {
                // The conditional update matched no row: diagnose whether
                // the variant is missing or merely short on stock.
                let reason = match self.classify(&mut tx, &item).await? {
                    Ok(available) | Err(RejectReason::InsufficientStock { available, .. }) => {
                        RejectReason::InsufficientStock {
                            available,
                            requested: item.quantity,
                        }
                    }
                    Err(reason) => reason,
                };

                tx.rollback().await?;

                warn!(
                    product = %item.product_uuid,
                    size = %item.size,
                    color = %item.color,
                    requested = item.quantity,
                    order_id = ctx.order_id.as_deref(),
                    reason = %reason.message(),
                    "stock reduction rejected"
                );

                outcome.rejected.push(RejectedItem { input, reason });
                continue;
            };

            let reduced_at = self
                .repository
                .touch_product(&mut tx, item.product_uuid)
                .await?
                .unwrap_or_else(Timestamp::now);

            tx.commit().await?;

            info!(
                product = %item.product_uuid,
                size = %item.size,
                color = %item.color,
                quantity = item.quantity,
                new_stock,
                transaction_id = ctx.transaction_id.as_deref(),
                order_id = ctx.order_id.as_deref(),
                "stock reduced"
            );

            self.ledger.record_change(
                ChangeKind::Update,
                item.product_uuid,
                json!({
                    "size": item.size,
                    "color": item.color,
                    "quantity": item.quantity,
                    "newStock": new_stock,
                    "orderId": ctx.order_id,
                    "transactionId": ctx.transaction_id,
                }),
            );

            self.notify(StockEvent::reduced(
                item.product_uuid,
                item.size.clone(),
                item.color.clone(),
                new_stock,
            ));

            outcome.reduced.push(ReducedItem {
                item,
                new_stock,
                reduced_at,
            });
        }

        Ok(outcome)
    }

    async fn pull_stock(&self, product_ids: Vec<String>) -> Result<SyncSnapshot, StockServiceError> {
        let mut tx = self.db.begin_transaction().await?;
        let mut snapshot = SyncSnapshot::default();

        for id in product_ids {
            let Ok(uuid) = id.parse::<Uuid>() else {
                snapshot.missing_product_ids.push(id);
                continue;
            };

            let Some(product) = self.repository.get_product(&mut tx, uuid).await? else {
                snapshot.missing_product_ids.push(id);
                continue;
            };

            let rows = self.repository.stock_tree(&mut tx, uuid).await?;

            snapshot.products.push(ProductStock::assemble(&product, rows));
        }

        tx.commit().await?;

        Ok(snapshot)
    }

    async fn push_stock(
        &self,
        items: Vec<StockItemInput>,
    ) -> Result<PushOutcome, StockServiceError> {
        let mut outcome = PushOutcome::default();

        for input in items {
            let item = match input.parse_touch() {
                Ok(item) => item,
                Err(reason) => {
                    outcome.rejected.push(RejectedItem { input, reason });
                    continue;
                }
            };

            let mut tx = self.db.begin_transaction().await?;

            // The push path never accepts a stock value from the client: it
            // reads the store's current count and only stamps `updated_at`.
            let stock = match self.locate_variant(&mut tx, &item).await? {
                Ok(stock) => stock,
                Err(reason) => {
                    tx.rollback().await?;
                    outcome.rejected.push(RejectedItem { input, reason });
                    continue;
                }
            };

            let touched_at = self
                .repository
                .touch_product(&mut tx, item.product_uuid)
                .await?
                .unwrap_or_else(Timestamp::now);

            tx.commit().await?;

            info!(
                product = %item.product_uuid,
                size = %item.size,
                color = %item.color,
                stock,
                "stock sync touch"
            );

            self.notify(StockEvent::updated(
                item.product_uuid,
                item.size.clone(),
                item.color.clone(),
                stock,
            ));

            outcome.touched.push(TouchedItem {
                item,
                stock,
                touched_at,
            });
        }

        Ok(outcome)
    }

    async fn product_stock(&self, uuid: Uuid) -> Result<ProductStock, StockServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let product = self
            .repository
            .get_product(&mut tx, uuid)
            .await?
            .ok_or(StockServiceError::NotFound)?;

        let rows = self.repository.stock_tree(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(ProductStock::assemble(&product, rows))
    }
}

#[automock]
#[async_trait]
pub trait StockService: Send + Sync {
    /// Classify a batch of requested quantities against current stock.
    /// Performs no writes and gives no hold on stock.
    async fn validate_stock(
        &self,
        items: Vec<StockItemInput>,
    ) -> Result<ValidationOutcome, StockServiceError>;

    /// Atomically decrement stock for each satisfiable item, appending to
    /// the change ledger and broadcasting one event per committed item.
    async fn reduce_stock(
        &self,
        items: Vec<StockItemInput>,
        ctx: ReductionContext,
    ) -> Result<ReductionOutcome, StockServiceError>;

    /// Fetch the authoritative stock tree for a set of product ids.
    /// Unresolved ids are reported in the snapshot, not as errors.
    async fn pull_stock(&self, product_ids: Vec<String>)
    -> Result<SyncSnapshot, StockServiceError>;

    /// Touch observed variants and broadcast their current stock so other
    /// clients showing stale state reconcile.
    async fn push_stock(&self, items: Vec<StockItemInput>)
    -> Result<PushOutcome, StockServiceError>;

    /// Stock snapshot for a single product.
    async fn product_stock(&self, uuid: Uuid) -> Result<ProductStock, StockServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        events::EventKind,
        test::{
            TestContext,
            helpers::{color_stock, seed_variant},
        },
    };

    use super::*;

    fn item(product: Uuid, color: &str, quantity: i64) -> StockItemInput {
        StockItemInput {
            product_id: Some(product.to_string()),
            size: Some("M".to_string()),
            color: Some(color.to_string()),
            quantity: Some(quantity),
        }
    }

    #[tokio::test]
    async fn reduce_beyond_available_rejects_and_preserves_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::new_v4();

        seed_variant(ctx.db.pool(), product, "M", "Red", 2).await;

        let outcome = ctx
            .stock
            .reduce_stock(vec![item(product, "Red", 3)], ReductionContext::default())
            .await?;

        assert!(!outcome.is_success());
        assert!(outcome.reduced.is_empty());
        assert_eq!(
            outcome.rejected[0].reason,
            RejectReason::InsufficientStock {
                available: 2,
                requested: 3,
            }
        );

        // The rejected decrement left the stored count untouched.
        assert_eq!(color_stock(ctx.db.pool(), product, "M", "Red").await, 2);

        Ok(())
    }

    #[tokio::test]
    async fn reduce_exact_stock_then_again_never_goes_negative() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::new_v4();

        seed_variant(ctx.db.pool(), product, "M", "Red", 2).await;

        let first = ctx
            .stock
            .reduce_stock(vec![item(product, "Red", 2)], ReductionContext::default())
            .await?;

        assert!(first.is_success());
        assert_eq!(first.reduced[0].new_stock, 0);

        let second = ctx
            .stock
            .reduce_stock(vec![item(product, "Red", 1)], ReductionContext::default())
            .await?;

        assert_eq!(
            second.rejected[0].reason,
            RejectReason::InsufficientStock {
                available: 0,
                requested: 1,
            }
        );
        assert_eq!(color_stock(ctx.db.pool(), product, "M", "Red").await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn reduce_partial_batch_commits_other_items() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::new_v4();

        seed_variant(ctx.db.pool(), product, "M", "Red", 5).await;
        seed_variant(ctx.db.pool(), product, "M", "Blue", 5).await;

        let outcome = ctx
            .stock
            .reduce_stock(
                vec![
                    item(product, "Red", 1),
                    item(product, "Chartreuse", 1),
                    item(product, "Blue", 2),
                ],
                ReductionContext::default(),
            )
            .await?;

        assert!(!outcome.is_success());
        assert_eq!(outcome.reduced.len(), 2);
        assert_eq!(
            outcome.rejected[0].reason,
            RejectReason::ColorVariantNotFound
        );

        // The failed middle item rolled back alone; its neighbors committed.
        assert_eq!(color_stock(ctx.db.pool(), product, "M", "Red").await, 4);
        assert_eq!(color_stock(ctx.db.pool(), product, "M", "Blue").await, 3);

        Ok(())
    }

    #[tokio::test]
    async fn reduce_appends_ledger_and_broadcasts() -> TestResult {
        let ctx = TestContext::new().await;
        let mut events = ctx.events.subscribe();
        let product = Uuid::new_v4();

        seed_variant(ctx.db.pool(), product, "M", "Red", 5).await;

        let outcome = ctx
            .stock
            .reduce_stock(vec![item(product, "Red", 2)], ReductionContext::default())
            .await?;

        assert!(outcome.is_success());

        let changes = ctx.ledger.recent_changes(None);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].product_uuid, product);
        assert_eq!(changes[0].detail.get("newStock"), Some(&json!(3)));

        let event = events.recv().await?;

        assert_eq!(event.event, EventKind::StockReduced);
        assert_eq!(event.stock, Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn validate_twice_returns_identical_classifications() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::new_v4();

        seed_variant(ctx.db.pool(), product, "M", "Red", 2).await;
        seed_variant(ctx.db.pool(), product, "M", "Blue", 0).await;

        let items = vec![
            item(product, "Red", 2),
            item(product, "Blue", 1),
            item(product, "Chartreuse", 1),
        ];

        let first = ctx.stock.validate_stock(items.clone()).await?;
        let second = ctx.stock.validate_stock(items).await?;

        // Validation writes nothing, so an unchanged store yields the same
        // classifications on every call.
        assert_eq!(first.valid_items, second.valid_items);
        assert_eq!(first.invalid_items, second.invalid_items);

        assert_eq!(first.valid_items.len(), 1);
        assert_eq!(
            first.invalid_items[0].reason,
            RejectReason::InsufficientStock {
                available: 0,
                requested: 1,
            }
        );
        assert_eq!(
            first.invalid_items[1].reason,
            RejectReason::ColorVariantNotFound
        );
        assert_eq!(color_stock(ctx.db.pool(), product, "M", "Red").await, 2);

        Ok(())
    }
}
