//! In-process [`ProductStore`] used by tests and local runs.
//!
//! Exclusive access is a per-product-code async mutex table. Every write
//! path (locked or optimistic) takes the row mutex, so a locked adjustment
//! and an optimistic edit on the same code never interleave. A table entry
//! lives only while someone holds or waits on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use super::{LockedProduct, ProductStore, StoreError};
use crate::paging::{Page, PageRequest, ProductFilter};
use crate::product::{NewProduct, Product, ProductStatus};
use crate::stock::{NewStockHistory, StockHistory};
use crate::types::DbId;

/// Default time to wait for a row lock.
pub const DEFAULT_LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<String, Product>,
    history: Vec<StockHistory>,
    next_product_id: DbId,
    next_history_id: DbId,
}

impl Tables {
    fn active(&self, product_code: &str) -> Option<&Product> {
        self.products
            .get(product_code)
            .filter(|p| !p.is_deleted() && p.status != ProductStatus::Deleted)
    }

    fn push_history(&mut self, entry: &NewStockHistory) -> StockHistory {
        self.next_history_id += 1;
        let row = history_row(self.next_history_id, entry);
        self.history.push(row.clone());
        row
    }
}

fn history_row(id: DbId, entry: &NewStockHistory) -> StockHistory {
    StockHistory {
        id,
        product_code: entry.product_code.clone(),
        adjustment_type: entry.adjustment_type,
        quantity: entry.quantity,
        previous_stock: entry.previous_stock,
        current_stock: entry.current_stock,
        reason: entry.reason.clone(),
        adjusted_by: entry.adjusted_by,
        adjusted_at: Utc::now(),
    }
}

/// Copy the mutable columns of `update` onto `stored` and bump the version.
fn written(stored: &Product, update: &Product) -> Product {
    Product {
        name: update.name.clone(),
        description: update.description.clone(),
        price: update.price,
        stock: update.stock,
        status: update.status,
        deleted_at: update.deleted_at,
        version: stored.version + 1,
        updated_at: Utc::now(),
        ..stored.clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type RowLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Drop the entry for `product_code` if the table holds the only reference.
///
/// Holders and waiters each own a clone of the entry's `Arc`, and clones are
/// only taken under the table mutex, so a count of one means nobody else
/// can reach the row mutex.
fn prune_row_lock(row_locks: &RowLocks, product_code: &str) {
    let mut locks = lock(row_locks);
    if locks
        .get(product_code)
        .is_some_and(|row_lock| Arc::strong_count(row_lock) == 1)
    {
        locks.remove(product_code);
    }
}

/// A held row mutex. Releasing it prunes the table entry when unused.
#[derive(Debug)]
struct RowLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    product_code: String,
    row_locks: RowLocks,
}

impl Drop for RowLockGuard {
    fn drop(&mut self) {
        // Release first; the guard owns a reference to the entry.
        drop(self.guard.take());
        prune_row_lock(&self.row_locks, &self.product_code);
    }
}

/// Product store kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryProductStore {
    tables: Arc<Mutex<Tables>>,
    row_locks: RowLocks,
    lock_wait_timeout: Duration,
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT_TIMEOUT)
    }
}

impl InMemoryProductStore {
    pub fn new(lock_wait_timeout: Duration) -> Self {
        Self {
            tables: Arc::default(),
            row_locks: Arc::default(),
            lock_wait_timeout,
        }
    }

    async fn acquire_row_lock(&self, product_code: &str) -> Result<RowLockGuard, StoreError> {
        let row_lock = {
            let mut locks = lock(&self.row_locks);
            Arc::clone(locks.entry(product_code.to_string()).or_default())
        };
        match tokio::time::timeout(self.lock_wait_timeout, row_lock.lock_owned()).await {
            Ok(guard) => Ok(RowLockGuard {
                guard: Some(guard),
                product_code: product_code.to_string(),
                row_locks: Arc::clone(&self.row_locks),
            }),
            Err(_) => {
                prune_row_lock(&self.row_locks, product_code);
                Err(StoreError::LockTimeout)
            }
        }
    }

    /// Number of history rows stored for `product_code`.
    pub fn history_len(&self, product_code: &str) -> usize {
        lock(&self.tables)
            .history
            .iter()
            .filter(|h| h.product_code == product_code)
            .count()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn exists(&self, product_code: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.tables).products.contains_key(product_code))
    }

    async fn insert(
        &self,
        input: &NewProduct,
        initial_history: Option<&NewStockHistory>,
    ) -> Result<Product, StoreError> {
        let mut tables = lock(&self.tables);
        if tables.products.contains_key(&input.product_code) {
            return Err(StoreError::Duplicate(
                "uq_products_product_code".to_string(),
            ));
        }

        tables.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: tables.next_product_id,
            product_code: input.product_code.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            stock: input.stock,
            status: ProductStatus::Active,
            seller_id: input.seller_id,
            category_id: input.category_id,
            version: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables
            .products
            .insert(product.product_code.clone(), product.clone());
        if let Some(entry) = initial_history {
            tables.push_history(entry);
        }
        Ok(product)
    }

    async fn fetch_for_read(&self, product_code: &str) -> Result<Option<Product>, StoreError> {
        Ok(lock(&self.tables).active(product_code).cloned())
    }

    async fn fetch_for_exclusive_update(
        &self,
        product_code: &str,
    ) -> Result<Option<Box<dyn LockedProduct>>, StoreError> {
        let row_lock = self.acquire_row_lock(product_code).await?;
        let current = lock(&self.tables).active(product_code).cloned();

        Ok(current.map(|current| {
            Box::new(MemoryLockedProduct {
                tables: Arc::clone(&self.tables),
                _row_lock: row_lock,
                current,
                staged_product: None,
                staged_history: Vec::new(),
            }) as Box<dyn LockedProduct>
        }))
    }

    async fn persist(
        &self,
        product: &Product,
        expected_version: i64,
    ) -> Result<Product, StoreError> {
        let _row_lock = self.acquire_row_lock(&product.product_code).await?;
        let mut tables = lock(&self.tables);
        let stored = tables
            .active(&product.product_code)
            .filter(|stored| stored.version == expected_version)
            .ok_or(StoreError::VersionMismatch)?;

        let updated = written(stored, product);
        tables
            .products
            .insert(updated.product_code.clone(), updated.clone());
        Ok(updated)
    }

    async fn list_active(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let keyword = filter.keyword.as_ref().map(|k| k.to_lowercase());
        let tables = lock(&self.tables);
        let mut matching: Vec<&Product> = tables
            .products
            .values()
            .filter(|p| !p.is_deleted() && p.status != ProductStatus::Deleted)
            .filter(|p| filter.category_id.map_or(true, |c| p.category_id == c))
            .filter(|p| {
                keyword
                    .as_ref()
                    .map_or(true, |k| p.name.to_lowercase().contains(k.as_str()))
            })
            .filter(|p| filter.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| filter.max_price.map_or(true, |max| p.price <= max))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, total, page))
    }

    async fn history(
        &self,
        product_code: &str,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, StoreError> {
        let tables = lock(&self.tables);
        let mut rows: Vec<&StockHistory> = tables
            .history
            .iter()
            .filter(|h| h.product_code == product_code)
            .collect();
        rows.sort_by(|a, b| b.adjusted_at.cmp(&a.adjusted_at).then(b.id.cmp(&a.id)));

        let total = rows.len() as i64;
        let content = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, total, page))
    }
}

/// Exclusive handle on one in-memory product row.
struct MemoryLockedProduct {
    tables: Arc<Mutex<Tables>>,
    _row_lock: RowLockGuard,
    current: Product,
    staged_product: Option<Product>,
    staged_history: Vec<NewStockHistory>,
}

#[async_trait]
impl LockedProduct for MemoryLockedProduct {
    fn current(&self) -> &Product {
        &self.current
    }

    async fn persist(&mut self, product: &Product) -> Result<Product, StoreError> {
        let base = self.staged_product.as_ref().unwrap_or(&self.current);
        let updated = written(base, product);
        self.staged_product = Some(updated.clone());
        Ok(updated)
    }

    async fn append_history(
        &mut self,
        entry: &NewStockHistory,
    ) -> Result<StockHistory, StoreError> {
        self.staged_history.push(entry.clone());
        // The id is provisional until commit, mirroring a sequence value.
        Ok(history_row(0, entry))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut tables = lock(&self.tables);
        if let Some(product) = self.staged_product.as_ref() {
            tables
                .products
                .insert(product.product_code.clone(), product.clone());
        }
        for entry in &self.staged_history {
            tables.push_history(entry);
        }
        Ok(())
    }
}
