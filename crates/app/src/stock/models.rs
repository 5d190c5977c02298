//! Stock Models

use jiff::Timestamp;
use uuid::Uuid;

/// A raw batch item as received from a client.
///
/// Every field is optional so that a malformed item can be rejected
/// individually without failing the rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockItemInput {
    pub product_id: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<i64>,
}

impl StockItemInput {
    /// Parse into a fully-formed `(product, size, color, quantity)` request.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when a field is missing or malformed.
    pub fn parse(&self) -> Result<StockItem, RejectReason> {
        let touch = self.parse_touch()?;

        let quantity = self.quantity.ok_or(RejectReason::MissingFields)?;

        if quantity < 1 {
            return Err(RejectReason::InvalidQuantity);
        }

        Ok(StockItem {
            product_uuid: touch.product_uuid,
            size: touch.size,
            color: touch.color,
            quantity,
        })
    }

    /// Parse into a `(product, size, color)` triple, ignoring quantity.
    ///
    /// Used by the push-sync path, which never lets a client supply a
    /// stock value.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when a field is missing or malformed.
    pub fn parse_touch(&self) -> Result<TouchItem, RejectReason> {
        let product_id = self.product_id.as_ref().ok_or(RejectReason::MissingFields)?;
        let size = self.size.as_ref().ok_or(RejectReason::MissingFields)?;
        let color = self.color.as_ref().ok_or(RejectReason::MissingFields)?;

        if size.is_empty() || color.is_empty() {
            return Err(RejectReason::MissingFields);
        }

        let product_uuid = product_id
            .parse::<Uuid>()
            .map_err(|_| RejectReason::MalformedProductId)?;

        Ok(TouchItem {
            product_uuid,
            size: size.clone(),
            color: color.clone(),
        })
    }
}

/// A fully parsed stock request item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockItem {
    pub product_uuid: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i64,
}

/// A parsed `(product, size, color)` triple with no quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchItem {
    pub product_uuid: Uuid,
    pub size: String,
    pub color: String,
}

/// Why a batch item was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// One or more required fields were absent or empty.
    MissingFields,

    /// The quantity was present but not a positive integer.
    InvalidQuantity,

    /// The product id did not parse as a UUID.
    MalformedProductId,

    /// No product exists with the given id.
    ProductNotFound,

    /// The product has no size variant with the given label.
    SizeVariantNotFound,

    /// The size variant has no color variant with the given label.
    ColorVariantNotFound,

    /// The variant exists but holds less stock than requested.
    InsufficientStock { available: i64, requested: i64 },
}

impl RejectReason {
    /// Human-readable message for API responses.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MissingFields => "Missing required fields".to_string(),
            Self::InvalidQuantity => "Quantity must be a positive integer".to_string(),
            Self::MalformedProductId => "Invalid product ID".to_string(),
            Self::ProductNotFound => "Product not found".to_string(),
            Self::SizeVariantNotFound => "Size variant not found".to_string(),
            Self::ColorVariantNotFound => "Color variant not found".to_string(),
            Self::InsufficientStock {
                available,
                requested,
            } => {
                format!("Insufficient stock: {available} available, {requested} requested")
            }
        }
    }
}

/// An accepted validation item, echoing the available quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidItem {
    pub item: StockItem,
    pub available: i64,
}

/// A rejected batch item, echoing the raw input alongside the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedItem {
    pub input: StockItemInput,
    pub reason: RejectReason,
}

/// Outcome of a batch validation. Performs no writes.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid_items: Vec<ValidItem>,
    pub invalid_items: Vec<RejectedItem>,
}

impl ValidationOutcome {
    /// True iff no item was rejected.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_items.is_empty()
    }
}

/// Identifiers threaded through a reduction for logging only.
///
/// The transaction id is an optional caller-supplied idempotency key; it
/// is not used for de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionContext {
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
}

/// A successfully committed decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedItem {
    pub item: StockItem,
    pub new_stock: i64,
    pub reduced_at: Timestamp,
}

/// Outcome of a batch reduction. Items are processed independently, so a
/// partial failure leaves the successful decrements committed.
#[derive(Debug, Clone, Default)]
pub struct ReductionOutcome {
    pub reduced: Vec<ReducedItem>,
    pub rejected: Vec<RejectedItem>,
}

impl ReductionOutcome {
    /// True iff every item committed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A successfully touched variant, carrying the store's current stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchedItem {
    pub item: TouchItem,
    pub stock: i64,
    pub touched_at: Timestamp,
}

/// Outcome of a push sync.
#[derive(Debug, Clone, Default)]
pub struct PushOutcome {
    pub touched: Vec<TouchedItem>,
    pub rejected: Vec<RejectedItem>,
}

impl PushOutcome {
    /// True iff every item was touched.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Product row as persisted.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub uuid: Uuid,
    pub title: String,
    /// Legacy flat stock count, present only on products that predate the
    /// variant model. Read-only; never written by any code path here.
    pub stock: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A single `(size, color, stock)` row from the variant tree query,
/// ordered by size position then color position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRow {
    pub size: String,
    pub color: String,
    pub stock: i64,
}

/// A color variant and its stock count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorStock {
    pub color: String,
    pub stock: i64,
}

/// A size variant and its color variants, in stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeStock {
    pub size: String,
    pub colors: Vec<ColorStock>,
}

/// The authoritative stock view of one product.
#[derive(Debug, Clone)]
pub struct ProductStock {
    pub product_uuid: Uuid,
    pub title: String,
    pub sizes: Vec<SizeStock>,
    /// Legacy flat stock, used only when `sizes` is empty.
    pub legacy_stock: Option<i64>,
    pub updated_at: Timestamp,
}

impl ProductStock {
    /// Group ordered variant rows under their size labels.
    #[must_use]
    pub fn assemble(product: &ProductRow, rows: Vec<VariantRow>) -> Self {
        let mut sizes: Vec<SizeStock> = Vec::new();

        for row in rows {
            match sizes.last_mut() {
                Some(last) if last.size == row.size => last.colors.push(ColorStock {
                    color: row.color,
                    stock: row.stock,
                }),
                _ => sizes.push(SizeStock {
                    size: row.size,
                    colors: vec![ColorStock {
                        color: row.color,
                        stock: row.stock,
                    }],
                }),
            }
        }

        Self {
            product_uuid: product.uuid,
            title: product.title.clone(),
            sizes,
            legacy_stock: product.stock,
            updated_at: product.updated_at,
        }
    }

    /// Whether the product carries any size/color variants.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.sizes.is_empty()
    }

    /// Total stock, always recomputed from the variants. The flat legacy
    /// count is consulted only for products with no variants at all.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        if self.has_variants() {
            self.sizes
                .iter()
                .flat_map(|size| size.colors.iter())
                .map(|color| color.stock)
                .sum()
        } else {
            self.legacy_stock.unwrap_or(0)
        }
    }
}

/// Result of a pull sync over a set of product ids.
#[derive(Debug, Clone, Default)]
pub struct SyncSnapshot {
    pub products: Vec<ProductStock>,
    /// Ids that did not resolve to an existing product, reported as data
    /// rather than as an error.
    pub missing_product_ids: Vec<String>,
}
