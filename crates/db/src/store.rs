//! PostgreSQL implementation of [`ProductStore`].
//!
//! Exclusive updates run inside a transaction that takes a `FOR UPDATE` row
//! lock under a transaction-local `lock_timeout`. The transaction is rolled
//! back when a [`PgLockedProduct`] is dropped without committing.

use std::time::Duration;

use async_trait::async_trait;
use catalog_core::paging::{Page, PageRequest, ProductFilter};
use catalog_core::product::{NewProduct, Product};
use catalog_core::stock::{NewStockHistory, StockHistory};
use catalog_core::store::{LockedProduct, ProductStore, StoreError};
use sqlx::{Postgres, Transaction};

use crate::repositories::{ProductRepo, StockHistoryRepo};
use crate::DbPool;

/// PostgreSQL SQLSTATE for `lock_not_available`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error onto the store error vocabulary.
///
/// - Lock wait timeouts map to [`StoreError::LockTimeout`].
/// - Unique violations on a `uq_`-prefixed constraint map to [`StoreError::Duplicate`].
/// - Everything else is a backend failure.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(LOCK_NOT_AVAILABLE) => return StoreError::LockTimeout,
            Some(UNIQUE_VIOLATION) => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return StoreError::Duplicate(constraint.to_string());
                }
            }
            _ => {}
        }
    }
    StoreError::Backend(Box::new(err))
}

/// Product store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgProductStore {
    pool: DbPool,
    lock_wait_timeout: Duration,
}

impl PgProductStore {
    pub fn new(pool: DbPool, lock_wait_timeout: Duration) -> Self {
        Self {
            pool,
            lock_wait_timeout,
        }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn exists(&self, product_code: &str) -> Result<bool, StoreError> {
        ProductRepo::code_exists(&self.pool, product_code)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert(
        &self,
        input: &NewProduct,
        initial_history: Option<&NewStockHistory>,
    ) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = ProductRepo::create(&mut *tx, input)
            .await
            .map_err(map_sqlx_error)?;
        if let Some(entry) = initial_history {
            StockHistoryRepo::append(&mut *tx, entry)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Product::try_from(row)
    }

    async fn fetch_for_read(&self, product_code: &str) -> Result<Option<Product>, StoreError> {
        ProductRepo::find_by_code(&self.pool, product_code)
            .await
            .map_err(map_sqlx_error)?
            .map(Product::try_from)
            .transpose()
    }

    async fn fetch_for_exclusive_update(
        &self,
        product_code: &str,
    ) -> Result<Option<Box<dyn LockedProduct>>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        ProductRepo::set_lock_timeout(&mut *tx, self.lock_wait_timeout.as_millis())
            .await
            .map_err(map_sqlx_error)?;
        let row = ProductRepo::find_by_code_for_update(&mut *tx, product_code)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let current = Product::try_from(row)?;
                Ok(Some(Box::new(PgLockedProduct {
                    tx,
                    version: current.version,
                    current,
                })))
            }
            None => Ok(None),
        }
    }

    async fn persist(
        &self,
        product: &Product,
        expected_version: i64,
    ) -> Result<Product, StoreError> {
        ProductRepo::update_versioned(&self.pool, product, expected_version)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::VersionMismatch)
            .and_then(Product::try_from)
    }

    async fn list_active(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let (rows, total) = ProductRepo::list_active(&self.pool, filter, page)
            .await
            .map_err(map_sqlx_error)?;
        let content = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(content, total, page))
    }

    async fn history(
        &self,
        product_code: &str,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, StoreError> {
        let (rows, total) = StockHistoryRepo::list_by_product(&self.pool, product_code, page)
            .await
            .map_err(map_sqlx_error)?;
        let content = rows
            .into_iter()
            .map(StockHistory::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(content, total, page))
    }
}

/// A product row locked by an open transaction.
pub struct PgLockedProduct {
    tx: Transaction<'static, Postgres>,
    current: Product,
    /// Version of the row as last written inside this transaction.
    version: i64,
}

#[async_trait]
impl LockedProduct for PgLockedProduct {
    fn current(&self) -> &Product {
        &self.current
    }

    async fn persist(&mut self, product: &Product) -> Result<Product, StoreError> {
        let written = ProductRepo::update_versioned(&mut *self.tx, product, self.version)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::VersionMismatch)
            .and_then(Product::try_from)?;
        self.version = written.version;
        Ok(written)
    }

    async fn append_history(
        &mut self,
        entry: &NewStockHistory,
    ) -> Result<StockHistory, StoreError> {
        StockHistoryRepo::append(&mut *self.tx, entry)
            .await
            .map_err(map_sqlx_error)
            .and_then(StockHistory::try_from)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
