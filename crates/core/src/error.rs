use crate::store::StoreError;

/// Domain-level error returned by every catalog operation.
///
/// Variants are typed outcomes, not crashes. Mapping to transport status
/// codes happens outside this crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The adjustment would take stock below zero. Carries the stock level
    /// observed under lock so callers can report it.
    #[error("Insufficient stock for {product_code}: current stock {current_stock}")]
    InsufficientStock {
        product_code: String,
        current_stock: i32,
    },

    /// Another writer committed first. The caller must re-fetch and resubmit.
    #[error("Version conflict on {product_code}: version {expected_version} is no longer current")]
    VersionConflict {
        product_code: String,
        expected_version: i64,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Exclusive lock not acquired within the configured wait. Transient.
    #[error("Timed out waiting for lock on {product_code}")]
    LockTimeout { product_code: String },

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl CoreError {
    /// Shorthand for a missing (or soft-deleted) product.
    pub fn product_not_found(product_code: &str) -> Self {
        CoreError::NotFound {
            entity: "Product",
            key: product_code.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
