//! Partial field edits for products.
//!
//! The edit itself is a pure merge. Conflict detection is left to the
//! store's compare-and-swap on `version`: [`ProductService::update_product`]
//! writes with the client's expected version and turns a mismatch into
//! [`CoreError::VersionConflict`](crate::error::CoreError::VersionConflict)
//! without retrying.
//!
//! [`ProductService::update_product`]: crate::service::ProductService::update_product

use crate::product::{Product, ProductChanges};

/// Overwrite only the fields present in `changes`.
///
/// Status and stock are untouched; a plain edit never re-derives
/// `SOLD_OUT`.
pub fn apply_edit(current: &Product, changes: &ProductChanges) -> Product {
    Product {
        name: changes.name.clone().unwrap_or_else(|| current.name.clone()),
        description: changes
            .description
            .clone()
            .or_else(|| current.description.clone()),
        price: changes.price.unwrap_or(current.price),
        ..current.clone()
    }
}
