//! Stock adjustment engine and stock history types.
//!
//! [`adjust`] is pure: it takes the product snapshot read under an exclusive
//! lock and returns the new snapshot plus exactly one history entry, or a
//! refusal. Lock handling and persistence belong to the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::product::{Product, ProductStatus};
use crate::types::{DbId, Timestamp};

/// Reason recorded on the history row written at product registration.
pub const INITIAL_STOCK_REASON: &str = "initial stock";

/// Kind of stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Goods received.
    Increase,
    /// Goods shipped out.
    Decrease,
    /// Stock count correction. The quantity is the target absolute level,
    /// not a delta.
    Correction,
}

impl AdjustmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentType::Increase => "INCREASE",
            AdjustmentType::Decrease => "DECREASE",
            AdjustmentType::Correction => "CORRECTION",
        }
    }

    /// Signed change to apply to `current_stock` for a requested `quantity`.
    pub fn delta(self, current_stock: i32, quantity: i32) -> i64 {
        let quantity = i64::from(quantity);
        match self {
            AdjustmentType::Increase => quantity,
            AdjustmentType::Decrease => -quantity,
            AdjustmentType::Correction => quantity - i64::from(current_stock),
        }
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCREASE" => Ok(AdjustmentType::Increase),
            "DECREASE" => Ok(AdjustmentType::Decrease),
            "CORRECTION" => Ok(AdjustmentType::Correction),
            other => Err(format!(
                "Invalid adjustment type '{other}'. Must be one of: INCREASE, DECREASE, CORRECTION"
            )),
        }
    }
}

/// A persisted, immutable stock history row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockHistory {
    pub id: DbId,
    pub product_code: String,
    pub adjustment_type: AdjustmentType,
    /// The requested magnitude as submitted, never the signed delta.
    pub quantity: i32,
    pub previous_stock: i32,
    pub current_stock: i32,
    pub reason: Option<String>,
    pub adjusted_by: DbId,
    pub adjusted_at: Timestamp,
}

/// A history row about to be appended. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStockHistory {
    pub product_code: String,
    pub adjustment_type: AdjustmentType,
    pub quantity: i32,
    pub previous_stock: i32,
    pub current_stock: i32,
    pub reason: Option<String>,
    pub adjusted_by: DbId,
}

/// Request body for a stock adjustment.
///
/// `adjustment_type` stays a string so an unknown value surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StockAdjustmentRequest {
    #[validate(length(min = 1, message = "adjustment type is required"))]
    pub adjustment_type: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 200, message = "reason must be at most 200 characters"))]
    pub reason: Option<String>,
}

impl StockAdjustmentRequest {
    pub fn parsed_type(&self) -> Result<AdjustmentType, CoreError> {
        self.adjustment_type.parse().map_err(CoreError::Validation)
    }
}

/// Result of an accepted adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustment {
    pub product: Product,
    pub history: NewStockHistory,
}

/// Status after stock lands on `new_stock`.
///
/// Zero stock always means `SOLD_OUT`. A sold-out product that regains stock
/// is relisted as `ACTIVE`; any other status is kept as is, so an `INACTIVE`
/// product that is restocked stays `INACTIVE`.
pub fn status_after_adjustment(previous: ProductStatus, new_stock: i32) -> ProductStatus {
    if new_stock == 0 {
        ProductStatus::SoldOut
    } else if previous == ProductStatus::SoldOut {
        ProductStatus::Active
    } else {
        previous
    }
}

/// Compute the outcome of adjusting `current` by `quantity` of `kind`.
///
/// `current` must have been read under an exclusive lock that the caller
/// keeps until the result is persisted.
pub fn adjust(
    current: &Product,
    kind: AdjustmentType,
    quantity: i32,
    adjusted_by: DbId,
    reason: Option<String>,
) -> Result<StockAdjustment, CoreError> {
    // CORRECTION may target zero; the relative kinds need a positive amount.
    let minimum = if kind == AdjustmentType::Correction { 0 } else { 1 };
    if quantity < minimum {
        return Err(CoreError::Validation(format!(
            "quantity for {kind} must be at least {minimum}, got {quantity}"
        )));
    }

    let new_stock = i64::from(current.stock) + kind.delta(current.stock, quantity);
    if new_stock < 0 {
        return Err(CoreError::InsufficientStock {
            product_code: current.product_code.clone(),
            current_stock: current.stock,
        });
    }
    let new_stock = i32::try_from(new_stock).map_err(|_| {
        CoreError::Validation(format!("resulting stock {new_stock} exceeds the supported maximum"))
    })?;

    let product = Product {
        stock: new_stock,
        status: status_after_adjustment(current.status, new_stock),
        ..current.clone()
    };
    let history = NewStockHistory {
        product_code: current.product_code.clone(),
        adjustment_type: kind,
        quantity,
        previous_stock: current.stock,
        current_stock: new_stock,
        reason,
        adjusted_by,
    };

    Ok(StockAdjustment { product, history })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn product(stock: i32, status: ProductStatus) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            product_code: "PRD-000001".to_string(),
            name: "Test product".to_string(),
            description: None,
            price: Decimal::from(10_000),
            stock,
            status,
            seller_id: 1,
            category_id: 1,
            version: 3,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn decrease_within_stock() {
        let current = product(100, ProductStatus::Active);
        let outcome = adjust(&current, AdjustmentType::Decrease, 30, 7, None).unwrap();

        assert_eq!(outcome.product.stock, 70);
        assert_eq!(outcome.product.status, ProductStatus::Active);
        assert_eq!(outcome.history.previous_stock, 100);
        assert_eq!(outcome.history.current_stock, 70);
        assert_eq!(outcome.history.quantity, 30);
        assert_eq!(outcome.history.adjusted_by, 7);
    }

    #[test]
    fn decrease_beyond_stock_is_refused() {
        let current = product(50, ProductStatus::Active);
        let result = adjust(&current, AdjustmentType::Decrease, 100, 7, None);

        assert_matches!(
            result,
            Err(CoreError::InsufficientStock { current_stock: 50, ref product_code })
                if product_code == "PRD-000001"
        );
    }

    #[test]
    fn refused_adjustment_message_reports_current_stock() {
        let current = product(50, ProductStatus::Active);
        let err = adjust(&current, AdjustmentType::Decrease, 100, 7, None).unwrap_err();
        assert!(err.to_string().contains("current stock 50"));
    }

    #[test]
    fn increase_relists_sold_out_product() {
        let current = product(0, ProductStatus::SoldOut);
        let outcome = adjust(&current, AdjustmentType::Increase, 5, 7, None).unwrap();

        assert_eq!(outcome.product.stock, 5);
        assert_eq!(outcome.product.status, ProductStatus::Active);
    }

    #[test]
    fn increase_keeps_inactive_product_inactive() {
        let current = product(0, ProductStatus::Inactive);
        let outcome = adjust(&current, AdjustmentType::Increase, 5, 7, None).unwrap();

        assert_eq!(outcome.product.stock, 5);
        assert_eq!(outcome.product.status, ProductStatus::Inactive);
    }

    #[test]
    fn correction_to_zero_sells_out() {
        let current = product(5, ProductStatus::Active);
        let outcome = adjust(&current, AdjustmentType::Correction, 0, 7, None).unwrap();

        assert_eq!(outcome.product.stock, 0);
        assert_eq!(outcome.product.status, ProductStatus::SoldOut);
        assert_eq!(outcome.history.quantity, 0);
    }

    #[test]
    fn correction_sets_absolute_level() {
        for (start, target) in [(0, 40), (100, 40), (40, 40), (7, 1)] {
            let current = product(start, ProductStatus::Active);
            let outcome =
                adjust(&current, AdjustmentType::Correction, target, 7, None).unwrap();
            assert_eq!(outcome.product.stock, target, "from {start} to {target}");
            assert_eq!(outcome.history.quantity, target);
            assert_eq!(outcome.history.previous_stock, start);
        }
    }

    #[test]
    fn correction_to_negative_target_is_refused() {
        let current = product(10, ProductStatus::Active);
        let result = adjust(&current, AdjustmentType::Correction, -1, 7, None);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn inactive_product_decreased_to_zero_sells_out() {
        let current = product(3, ProductStatus::Inactive);
        let outcome = adjust(&current, AdjustmentType::Decrease, 3, 7, None).unwrap();
        assert_eq!(outcome.product.status, ProductStatus::SoldOut);
    }

    #[test]
    fn relative_adjustments_need_positive_quantity() {
        let current = product(10, ProductStatus::Active);
        for kind in [AdjustmentType::Increase, AdjustmentType::Decrease] {
            assert_matches!(
                adjust(&current, kind, 0, 7, None),
                Err(CoreError::Validation(_))
            );
        }
    }

    #[test]
    fn overflowing_increase_is_refused() {
        let current = product(i32::MAX, ProductStatus::Active);
        let result = adjust(&current, AdjustmentType::Increase, 1, 7, None);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn history_matches_signed_delta() {
        let cases = [
            (AdjustmentType::Increase, 10, 4),
            (AdjustmentType::Decrease, 10, 4),
            (AdjustmentType::Correction, 10, 4),
            (AdjustmentType::Correction, 4, 10),
        ];
        for (kind, start, quantity) in cases {
            let current = product(start, ProductStatus::Active);
            let outcome = adjust(&current, kind, quantity, 7, Some("count".into())).unwrap();
            let delta = kind.delta(start, quantity);
            assert_eq!(
                i64::from(outcome.history.current_stock),
                i64::from(outcome.history.previous_stock) + delta
            );
            assert_eq!(outcome.history.adjustment_type, kind);
            assert_eq!(outcome.history.reason.as_deref(), Some("count"));
        }
    }

    #[test]
    fn engine_leaves_version_and_other_fields_alone() {
        let current = product(10, ProductStatus::Active);
        let outcome = adjust(&current, AdjustmentType::Increase, 1, 7, None).unwrap();
        assert_eq!(outcome.product.version, current.version);
        assert_eq!(outcome.product.name, current.name);
        assert_eq!(outcome.product.price, current.price);
    }

    #[test]
    fn adjustment_type_parsing() {
        assert_eq!("CORRECTION".parse::<AdjustmentType>(), Ok(AdjustmentType::Correction));
        let err = "RESTOCK".parse::<AdjustmentType>().unwrap_err();
        assert!(err.contains("Invalid adjustment type"));
    }

    #[test]
    fn status_derivation_table() {
        use ProductStatus::*;
        assert_eq!(status_after_adjustment(Active, 0), SoldOut);
        assert_eq!(status_after_adjustment(Inactive, 0), SoldOut);
        assert_eq!(status_after_adjustment(SoldOut, 0), SoldOut);
        assert_eq!(status_after_adjustment(SoldOut, 1), Active);
        assert_eq!(status_after_adjustment(Active, 1), Active);
        assert_eq!(status_after_adjustment(Inactive, 1), Inactive);
    }
}
