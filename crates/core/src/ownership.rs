//! Seller ownership check for product mutations.
//!
//! Guards update and delete. Stock adjustment is deliberately not gated:
//! any identified actor holding the product code may adjust stock.

use crate::error::CoreError;
use crate::product::Product;
use crate::types::DbId;

/// Reject the mutation unless `acting_user_id` is the product's seller.
pub fn assert_owner(product: &Product, acting_user_id: DbId) -> Result<(), CoreError> {
    if product.seller_id == acting_user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "User {acting_user_id} does not own product {}",
            product.product_code
        )))
    }
}
