//! Product catalog and stock operations.
//!
//! [`ProductService`] sequences the pure rules (engine, ownership, edit)
//! around a [`ProductStore`]:
//!
//! - stock adjustments take the exclusive row lock, compute, persist,
//!   append history, then commit;
//! - edits and deletes check ownership, then write through the store's
//!   version compare-and-swap with no lock held.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::edit::apply_edit;
use crate::error::CoreError;
use crate::ownership::assert_owner;
use crate::paging::{Page, PageRequest, ProductFilter};
use crate::product::{NewProduct, Product, ProductChanges};
use crate::stock::{
    self, AdjustmentType, NewStockHistory, StockAdjustmentRequest, StockHistory,
    INITIAL_STOCK_REASON,
};
use crate::store::{ProductStore, StoreError};
use crate::types::DbId;

/// Map a store failure for `product_code` into a domain error.
fn store_error(product_code: &str, err: StoreError) -> CoreError {
    match err {
        StoreError::LockTimeout => CoreError::LockTimeout {
            product_code: product_code.to_string(),
        },
        StoreError::Duplicate(constraint) => CoreError::Conflict(format!(
            "Product code {product_code} already exists ({constraint})"
        )),
        other => {
            tracing::error!(product_code, error = %other, "Product store failure");
            CoreError::Storage(other)
        }
    }
}

/// Catalog operations over a shared product store.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Register a new product.
    ///
    /// A positive initial stock is recorded as an `INCREASE` history row
    /// attributed to the seller, written together with the product.
    pub async fn create_product(&self, input: &NewProduct) -> Result<Product, CoreError> {
        input.validate()?;
        let code = input.product_code.as_str();
        tracing::info!(product_code = code, seller_id = input.seller_id, "Creating product");

        if self.store.exists(code).await.map_err(|e| store_error(code, e))? {
            tracing::warn!(product_code = code, "Duplicate product code");
            return Err(CoreError::Conflict(format!(
                "Product code {code} already exists"
            )));
        }

        let initial_history = (input.stock > 0).then(|| NewStockHistory {
            product_code: input.product_code.clone(),
            adjustment_type: AdjustmentType::Increase,
            quantity: input.stock,
            previous_stock: 0,
            current_stock: input.stock,
            reason: Some(INITIAL_STOCK_REASON.to_string()),
            adjusted_by: input.seller_id,
        });

        let product = self
            .store
            .insert(input, initial_history.as_ref())
            .await
            .map_err(|e| store_error(code, e))?;

        tracing::info!(product_code = code, product_id = product.id, "Product created");
        Ok(product)
    }

    /// Fetch an active product. Soft-deleted products are not found.
    pub async fn get_product(&self, product_code: &str) -> Result<Product, CoreError> {
        self.store
            .fetch_for_read(product_code)
            .await
            .map_err(|e| store_error(product_code, e))?
            .ok_or_else(|| CoreError::product_not_found(product_code))
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, CoreError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "min_price {min} must not exceed max_price {max}"
                )));
            }
        }
        self.store.list_active(filter, page).await.map_err(|err| {
            tracing::error!(error = %err, "Product listing failed");
            CoreError::Storage(err)
        })
    }

    /// Apply a partial edit written at `changes.version`.
    ///
    /// The write is conditioned on the stored version still equalling
    /// `changes.version`; a concurrent commit in between surfaces as
    /// [`CoreError::VersionConflict`]. Never retried here.
    ///
    /// The expected version is the client's `changes.version`, not the
    /// version of the row read for the ownership check. A client holding a
    /// stale version conflicts even when that read already saw the newer row.
    pub async fn update_product(
        &self,
        product_code: &str,
        changes: &ProductChanges,
        acting_user_id: DbId,
    ) -> Result<Product, CoreError> {
        changes.validate()?;
        tracing::info!(product_code, user_id = acting_user_id, "Updating product");

        let current = self.get_product(product_code).await?;
        assert_owner(&current, acting_user_id)?;

        let edited = apply_edit(&current, changes);
        let updated = self
            .store
            .persist(&edited, changes.version)
            .await
            .map_err(|err| match err {
                StoreError::VersionMismatch => {
                    tracing::warn!(
                        product_code,
                        expected_version = changes.version,
                        "Version conflict detected"
                    );
                    CoreError::VersionConflict {
                        product_code: product_code.to_string(),
                        expected_version: changes.version,
                    }
                }
                other => store_error(product_code, other),
            })?;

        tracing::info!(product_code, version = updated.version, "Product updated");
        Ok(updated)
    }

    /// Soft-delete a product owned by `acting_user_id`.
    pub async fn delete_product(
        &self,
        product_code: &str,
        acting_user_id: DbId,
    ) -> Result<(), CoreError> {
        tracing::info!(product_code, user_id = acting_user_id, "Deleting product");

        let current = self.get_product(product_code).await?;
        assert_owner(&current, acting_user_id)?;

        self.store
            .persist(&current.soft_deleted(Utc::now()), current.version)
            .await
            .map_err(|err| match err {
                StoreError::VersionMismatch => CoreError::VersionConflict {
                    product_code: product_code.to_string(),
                    expected_version: current.version,
                },
                other => store_error(product_code, other),
            })?;

        tracing::info!(product_code, "Product deleted");
        Ok(())
    }

    /// Adjust stock under an exclusive row lock.
    ///
    /// Not gated by ownership. A refused adjustment rolls back: stock,
    /// status and version stay as they were and no history row is written.
    pub async fn adjust_stock(
        &self,
        product_code: &str,
        request: &StockAdjustmentRequest,
        acting_user_id: DbId,
    ) -> Result<Product, CoreError> {
        request.validate()?;
        let kind = request.parsed_type()?;
        tracing::info!(
            product_code,
            adjustment_type = %kind,
            quantity = request.quantity,
            "Adjusting stock"
        );

        let mut locked = self
            .store
            .fetch_for_exclusive_update(product_code)
            .await
            .map_err(|e| store_error(product_code, e))?
            .ok_or_else(|| CoreError::product_not_found(product_code))?;

        let outcome = stock::adjust(
            locked.current(),
            kind,
            request.quantity,
            acting_user_id,
            request.reason.clone(),
        )
        .inspect_err(|err| {
            tracing::warn!(product_code, error = %err, "Stock adjustment refused");
        })?;

        let product = locked
            .persist(&outcome.product)
            .await
            .map_err(|e| store_error(product_code, e))?;
        locked
            .append_history(&outcome.history)
            .await
            .map_err(|e| store_error(product_code, e))?;
        locked
            .commit()
            .await
            .map_err(|e| store_error(product_code, e))?;

        tracing::info!(
            product_code,
            previous_stock = outcome.history.previous_stock,
            new_stock = product.stock,
            status = %product.status,
            "Stock adjusted"
        );
        Ok(product)
    }

    /// Stock history for a product, newest first.
    pub async fn stock_history(
        &self,
        product_code: &str,
        page: PageRequest,
    ) -> Result<Page<StockHistory>, CoreError> {
        self.store
            .history(product_code, page)
            .await
            .map_err(|e| store_error(product_code, e))
    }
}
