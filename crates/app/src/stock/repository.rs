//! Stock Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::stock::models::{ProductRow, StockItem, VariantRow};

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const SIZE_VARIANT_EXISTS_SQL: &str = include_str!("sql/size_variant_exists.sql");
const FIND_COLOR_STOCK_SQL: &str = include_str!("sql/find_color_stock.sql");
const REDUCE_STOCK_SQL: &str = include_str!("sql/reduce_stock.sql");
const TOUCH_PRODUCT_SQL: &str = include_str!("sql/touch_product.sql");
const GET_STOCK_TREE_SQL: &str = include_str!("sql/get_stock_tree.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockRepository;

impl PgStockRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: Uuid,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        query_as::<Postgres, ProductRow>(GET_PRODUCT_SQL)
            .bind(uuid)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn size_variant_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_uuid: Uuid,
        size: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(SIZE_VARIANT_EXISTS_SQL)
            .bind(product_uuid)
            .bind(size)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_color_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_uuid: Uuid,
        size: &str,
        color: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        query_scalar::<Postgres, i64>(FIND_COLOR_STOCK_SQL)
            .bind(product_uuid)
            .bind(size)
            .bind(color)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Decrement a variant's stock as a single conditional update.
    ///
    /// The `stock >= quantity` guard makes the decrement atomic with
    /// respect to concurrent reducers on the same variant: stock can never
    /// go negative, and a `None` result means the guard (or a lookup)
    /// failed rather than that a read-then-write pair raced.
    pub(crate) async fn reduce_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &StockItem,
    ) -> Result<Option<i64>, sqlx::Error> {
        query_scalar::<Postgres, i64>(REDUCE_STOCK_SQL)
            .bind(item.product_uuid)
            .bind(&item.size)
            .bind(&item.color)
            .bind(item.quantity)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Stamp the product's `updated_at`, returning the new timestamp.
    pub(crate) async fn touch_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: Uuid,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let row = query(TOUCH_PRODUCT_SQL)
            .bind(uuid)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|row| {
            row.try_get::<SqlxTimestamp, _>("updated_at")
                .map(SqlxTimestamp::to_jiff)
        })
        .transpose()
    }

    pub(crate) async fn stock_tree(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_uuid: Uuid,
    ) -> Result<Vec<VariantRow>, sqlx::Error> {
        query_as::<Postgres, VariantRow>(GET_STOCK_TREE_SQL)
            .bind(product_uuid)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            title: row.try_get("title")?,
            stock: row.try_get("stock")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for VariantRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            size: row.try_get("size")?,
            color: row.try_get("color")?,
            stock: row.try_get("stock")?,
        })
    }
}
