//! Repository for the append-only `stock_history` table.

use catalog_core::paging::PageRequest;
use catalog_core::stock::NewStockHistory;
use sqlx::{PgConnection, PgPool};

use crate::models::stock_history::StockHistoryRow;

const COLUMNS: &str = "id, product_code, adjustment_type, quantity, previous_stock, \
    current_stock, reason, adjusted_by, adjusted_at";

/// Provides stock ledger persistence. Rows are never updated or deleted.
pub struct StockHistoryRepo;

impl StockHistoryRepo {
    /// Append one ledger row inside the caller's transaction.
    ///
    /// `adjusted_at` is taken at statement time so it follows row-lock order,
    /// not transaction start order.
    pub async fn append(
        conn: &mut PgConnection,
        entry: &NewStockHistory,
    ) -> Result<StockHistoryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_history
                (product_code, adjustment_type, quantity, previous_stock, current_stock,
                 reason, adjusted_by, adjusted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, clock_timestamp())
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StockHistoryRow>(&query)
            .bind(&entry.product_code)
            .bind(entry.adjustment_type.as_str())
            .bind(entry.quantity)
            .bind(entry.previous_stock)
            .bind(entry.current_stock)
            .bind(&entry.reason)
            .bind(entry.adjusted_by)
            .fetch_one(conn)
            .await
    }

    /// One page of ledger rows for `product_code`, newest first, plus the total.
    pub async fn list_by_product(
        pool: &PgPool,
        product_code: &str,
        page: PageRequest,
    ) -> Result<(Vec<StockHistoryRow>, i64), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_history WHERE product_code = $1",
        )
        .bind(product_code)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM stock_history
             WHERE product_code = $1
             ORDER BY adjusted_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, StockHistoryRow>(&query)
            .bind(product_code)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }
}
