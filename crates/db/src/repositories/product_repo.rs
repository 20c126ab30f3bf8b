//! Repository for the `products` table.

use catalog_core::paging::{PageRequest, ProductFilter};
use catalog_core::product::{NewProduct, Product, ProductStatus};
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::product::ProductRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, product_code, name, description, price, stock, status, \
    seller_id, category_id, version, deleted_at, created_at, updated_at";

/// Rows visible to catalog reads.
const ACTIVE: &str = "deleted_at IS NULL AND status <> 'DELETED'";

/// Provides product persistence.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new `ACTIVE` product at version 0, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewProduct,
    ) -> Result<ProductRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO products
                (product_code, name, description, price, stock, status, seller_id, category_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(&input.product_code)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.stock)
            .bind(ProductStatus::Active.as_str())
            .bind(input.seller_id)
            .bind(input.category_id)
            .fetch_one(conn)
            .await
    }

    /// Whether any row, soft-deleted or not, uses `product_code`.
    pub async fn code_exists(pool: &PgPool, product_code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE product_code = $1)",
        )
        .bind(product_code)
        .fetch_one(pool)
        .await
    }

    /// Find a product by code. Excludes soft-deleted rows.
    pub async fn find_by_code(
        pool: &PgPool,
        product_code: &str,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE product_code = $1 AND {ACTIVE}");
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(product_code)
            .fetch_optional(pool)
            .await
    }

    /// Find a product by code and take a row lock held until the enclosing
    /// transaction ends. Excludes soft-deleted rows.
    pub async fn find_by_code_for_update(
        conn: &mut PgConnection,
        product_code: &str,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products WHERE product_code = $1 AND {ACTIVE} FOR UPDATE"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(product_code)
            .fetch_optional(conn)
            .await
    }

    /// Bound how long the current transaction waits on row locks.
    pub async fn set_lock_timeout(
        conn: &mut PgConnection,
        timeout_ms: u128,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{timeout_ms}ms"))
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Write the mutable fields of `product` if the row is still at
    /// `expected_version`, bumping the version by one.
    ///
    /// Returns `None` when no live row matches the code and version.
    pub async fn update_versioned<'e>(
        executor: impl PgExecutor<'e>,
        product: &Product,
        expected_version: i64,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                name = $3,
                description = $4,
                price = $5,
                stock = $6,
                status = $7,
                deleted_at = $8,
                version = version + 1,
                updated_at = NOW()
             WHERE product_code = $1 AND version = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(&product.product_code)
            .bind(expected_version)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .bind(product.status.as_str())
            .bind(product.deleted_at)
            .fetch_optional(executor)
            .await
    }

    /// One page of active products matching `filter`, newest first, plus
    /// the total number of matches.
    pub async fn list_active(
        pool: &PgPool,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProductRow>, i64), sqlx::Error> {
        let mut count = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM products WHERE {ACTIVE}"
        ));
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COLUMNS} FROM products WHERE {ACTIVE}"
        ));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.size)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<ProductRow>().fetch_all(pool).await?;

        Ok((rows, total))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(keyword) = &filter.keyword {
        builder
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(keyword)));
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
}

/// Escape `LIKE` wildcards so the keyword matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
