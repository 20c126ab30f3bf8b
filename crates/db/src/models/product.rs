//! Row model for the `products` table.

use catalog_core::product::{Product, ProductStatus};
use catalog_core::store::StoreError;
use catalog_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A row from the `products` table. `status` is stored as TEXT.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: DbId,
    pub product_code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub status: String,
    pub seller_id: DbId,
    pub category_id: DbId,
    pub version: i64,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ProductStatus>()
            .map_err(|e| {
                StoreError::Corrupt(format!("products.status for {}: {e}", row.product_code))
            })?;

        Ok(Product {
            id: row.id,
            product_code: row.product_code,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            status,
            seller_id: row.seller_id,
            category_id: row.category_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}
