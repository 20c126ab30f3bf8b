//! Storage abstraction consumed by [`ProductService`](crate::service::ProductService).
//!
//! A store offers two write paths:
//!
//! - **Exclusive**: [`ProductStore::fetch_for_exclusive_update`] returns a
//!   [`LockedProduct`] that holds the row lock until it is committed or
//!   dropped. Stock adjustments go through this path.
//! - **Optimistic**: [`ProductStore::persist`] writes only if the stored
//!   version still equals `expected_version`, bumping it by one.

pub mod memory;

use async_trait::async_trait;

use crate::paging::{Page, PageRequest, ProductFilter};
use crate::product::{NewProduct, Product};
use crate::stock::{NewStockHistory, StockHistory};

pub use memory::InMemoryProductStore;

/// Errors surfaced by a [`ProductStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-swap failed: the row is no longer at the expected version.
    #[error("Row version changed since it was read")]
    VersionMismatch,

    #[error("Timed out waiting for row lock")]
    LockTimeout,

    /// A unique constraint rejected the write.
    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back into the domain model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// The backend itself failed (connection loss, I/O, ...).
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Durable product and stock-history storage keyed by product code.
///
/// Soft-deleted products are invisible to every read except the
/// duplicate-code check in [`ProductStore::exists`].
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Whether any product (including soft-deleted ones) uses `product_code`.
    async fn exists(&self, product_code: &str) -> Result<bool, StoreError>;

    /// Insert a new `ACTIVE` product at version 0, together with its
    /// initial history row in the same transaction.
    async fn insert(
        &self,
        input: &NewProduct,
        initial_history: Option<&NewStockHistory>,
    ) -> Result<Product, StoreError>;

    /// Unlocked read.
    async fn fetch_for_read(&self, product_code: &str) -> Result<Option<Product>, StoreError>;

    /// Read the product and hold an exclusive lock on it until the returned
    /// handle is committed or dropped. Waits at most the store's lock wait
    /// timeout, then fails with [`StoreError::LockTimeout`].
    async fn fetch_for_exclusive_update(
        &self,
        product_code: &str,
    ) -> Result<Option<Box<dyn LockedProduct>>, StoreError>;

    /// Write the mutable fields of `product` if the stored row is still at
    /// `expected_version`. Returns the stored row with `version` bumped by one.
    async fn persist(&self, product: &Product, expected_version: i64)
        -> Result<Product, StoreError>;

    /// Active (non-deleted) products matching `filter`.
    async fn list_active(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError>;

    /// Stock history for `product_code`, newest first.
    async fn history(
        &self,
        product_code: &str,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, StoreError>;
}

/// A product row held under an exclusive lock.
///
/// Writes are staged in the same transaction and only become visible on
/// [`LockedProduct::commit`]. Dropping the handle rolls back and releases
/// the lock.
#[async_trait]
pub trait LockedProduct: Send {
    /// The row as read when the lock was taken.
    fn current(&self) -> &Product;

    /// Write the mutable fields of `product`, bumping `version` by one.
    async fn persist(&mut self, product: &Product) -> Result<Product, StoreError>;

    /// Append one stock history row.
    async fn append_history(&mut self, entry: &NewStockHistory)
        -> Result<StockHistory, StoreError>;

    /// Commit staged writes and release the lock.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
