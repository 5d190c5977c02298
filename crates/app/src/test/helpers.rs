//! Test Helpers

use sqlx::{PgPool, query, query_scalar};
use uuid::Uuid;

pub(crate) async fn seed_product(pool: &PgPool, product: Uuid) {
    query("INSERT INTO products (uuid, title) VALUES ($1, 'Test Product') ON CONFLICT (uuid) DO NOTHING")
        .bind(product)
        .execute(pool)
        .await
        .expect("failed to insert product");
}

/// Insert a product (if missing) with a size/color variant holding
/// `stock` units. Positions follow insertion order.
pub(crate) async fn seed_variant(
    pool: &PgPool,
    product: Uuid,
    size: &str,
    color: &str,
    stock: i64,
) {
    seed_product(pool, product).await;

    let existing = query_scalar::<_, i64>(
        "SELECT id FROM size_variants WHERE product_uuid = $1 AND size = $2",
    )
    .bind(product)
    .bind(size)
    .fetch_optional(pool)
    .await
    .expect("failed to look up size variant");

    let size_id = match existing {
        Some(id) => id,
        None => query_scalar::<_, i64>(
            "INSERT INTO size_variants (product_uuid, position, size) \
             VALUES ($1, (SELECT COUNT(*) FROM size_variants WHERE product_uuid = $1), $2) \
             RETURNING id",
        )
        .bind(product)
        .bind(size)
        .fetch_one(pool)
        .await
        .expect("failed to insert size variant"),
    };

    query(
        "INSERT INTO color_variants (size_variant_id, position, color, stock) \
         VALUES ($1, (SELECT COUNT(*) FROM color_variants WHERE size_variant_id = $1), $2, $3)",
    )
    .bind(size_id)
    .bind(color)
    .bind(stock)
    .execute(pool)
    .await
    .expect("failed to insert color variant");
}

/// Read a variant's current stock straight from the store.
pub(crate) async fn color_stock(pool: &PgPool, product: Uuid, size: &str, color: &str) -> i64 {
    query_scalar(
        "SELECT cv.stock FROM color_variants cv \
         JOIN size_variants sv ON sv.id = cv.size_variant_id \
         WHERE sv.product_uuid = $1 AND sv.size = $2 AND cv.color = $3",
    )
    .bind(product)
    .bind(size)
    .bind(color)
    .fetch_one(pool)
    .await
    .expect("failed to read variant stock")
}
