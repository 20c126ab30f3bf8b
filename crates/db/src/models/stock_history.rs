//! Row model for the `stock_history` table.

use catalog_core::stock::{AdjustmentType, StockHistory};
use catalog_core::store::StoreError;
use catalog_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `stock_history` table.
#[derive(Debug, Clone, FromRow)]
pub struct StockHistoryRow {
    pub id: DbId,
    pub product_code: String,
    pub adjustment_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub current_stock: i32,
    pub reason: Option<String>,
    pub adjusted_by: DbId,
    pub adjusted_at: Timestamp,
}

impl TryFrom<StockHistoryRow> for StockHistory {
    type Error = StoreError;

    fn try_from(row: StockHistoryRow) -> Result<Self, Self::Error> {
        let adjustment_type = row
            .adjustment_type
            .parse::<AdjustmentType>()
            .map_err(|e| StoreError::Corrupt(format!("stock_history.adjustment_type: {e}")))?;

        Ok(StockHistory {
            id: row.id,
            product_code: row.product_code,
            adjustment_type,
            quantity: row.quantity,
            previous_stock: row.previous_stock,
            current_stock: row.current_stock,
            reason: row.reason,
            adjusted_by: row.adjusted_by,
            adjusted_at: row.adjusted_at,
        })
    }
}
