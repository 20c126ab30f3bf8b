//! Product domain model, request DTOs and their validation rules.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::types::{DbId, Timestamp};

/// Prices are whole multiples of this unit.
pub const PRICE_UNIT: Decimal = Decimal::ONE_HUNDRED;

/// Upper bound (inclusive) for any product price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

static PRODUCT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PRD-[0-9]{6}$").expect("product code pattern is a valid regex")
});

/// Hangul, ASCII letters and digits, whitespace and `!@#`.
static PRODUCT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[가-힣a-zA-Z0-9\s!@#]+$").expect("product name pattern is a valid regex")
});

/// Product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Inactive,
    SoldOut,
    Deleted,
}

impl ProductStatus {
    /// The persisted text form (`ACTIVE`, `SOLD_OUT`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
            ProductStatus::SoldOut => "SOLD_OUT",
            ProductStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ProductStatus::Active),
            "INACTIVE" => Ok(ProductStatus::Inactive),
            "SOLD_OUT" => Ok(ProductStatus::SoldOut),
            "DELETED" => Ok(ProductStatus::Deleted),
            other => Err(format!("Unknown product status '{other}'")),
        }
    }
}

/// An immutable product snapshot as read from the store.
///
/// Mutations never happen in place: the engine and guards return a new
/// snapshot which the store then persists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: DbId,
    pub product_code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
    pub seller_id: DbId,
    pub category_id: DbId,
    /// Optimistic concurrency token. Bumped by exactly one on every write.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

impl Product {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Soft-delete tombstone: status becomes `DELETED` and `deleted_at` is set.
    pub fn soft_deleted(&self, at: Timestamp) -> Product {
        Product {
            status: ProductStatus::Deleted,
            deleted_at: Some(at),
            ..self.clone()
        }
    }
}

/// DTO for registering a new product.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(custom(function = "validate_product_code"))]
    pub product_code: String,
    #[validate(
        length(min = 2, max = 100, message = "name must be 2-100 characters"),
        custom(function = "validate_product_name")
    )]
    pub name: String,
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: i32,
    pub seller_id: DbId,
    pub category_id: DbId,
}

/// DTO for a partial product edit. Absent fields keep their current value.
///
/// `version` is the version the client last read; the write only lands if
/// the stored row is still at that version.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductChanges {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    pub version: i64,
}

fn validate_product_code(code: &str) -> Result<(), ValidationError> {
    if PRODUCT_CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("product_code_format")
            .with_message(Cow::Borrowed("product code must match PRD-XXXXXX")))
    }
}

/// Only applied at creation; edits are checked for length alone.
fn validate_product_name(name: &str) -> Result<(), ValidationError> {
    if PRODUCT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("product_name_chars")
            .with_message(Cow::Borrowed("name contains characters that are not allowed")))
    }
}

/// Price must lie within `0..=MAX_PRICE` and be a whole multiple of [`PRICE_UNIT`].
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO || *price > MAX_PRICE {
        return Err(ValidationError::new("price_range")
            .with_message(Cow::Borrowed("price must be between 0 and 100000000")));
    }
    if !(*price % PRICE_UNIT).is_zero() {
        return Err(ValidationError::new("price_unit")
            .with_message(Cow::Borrowed("price must be a multiple of 100")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            product_code: "PRD-000001".to_string(),
            name: "Test product".to_string(),
            description: Some("A product".to_string()),
            price: Decimal::from(10_000),
            stock: 100,
            seller_id: 1,
            category_id: 1,
        }
    }

    #[test]
    fn valid_new_product_passes() {
        assert!(new_product().validate().is_ok());
    }

    #[test]
    fn malformed_product_code_rejected() {
        for code in ["PRD-1", "prd-000001", "PRD-0000012", "XYZ-000001", ""] {
            let input = NewProduct {
                product_code: code.to_string(),
                ..new_product()
            };
            assert!(input.validate().is_err(), "{code} should be rejected");
        }
    }

    #[test]
    fn short_name_rejected() {
        let input = NewProduct {
            name: "a".to_string(),
            ..new_product()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn name_with_disallowed_characters_rejected() {
        for name in ["Desk <script>", "Lamp; DROP", "50% off"] {
            let input = NewProduct {
                name: name.to_string(),
                ..new_product()
            };
            let errors = input.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("name"), "{name} should be rejected");
        }
    }

    #[test]
    fn name_allows_hangul_and_marks() {
        for name in ["책상 램프", "Desk Lamp 2", "Sale!@#"] {
            let input = NewProduct {
                name: name.to_string(),
                ..new_product()
            };
            assert!(input.validate().is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn negative_initial_stock_rejected() {
        let input = NewProduct {
            stock: -1,
            ..new_product()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn price_must_be_multiple_of_hundred() {
        assert!(validate_price(&Decimal::from(10_000)).is_ok());
        assert!(validate_price(&Decimal::ZERO).is_ok());
        let err = validate_price(&Decimal::from(10_050)).unwrap_err();
        assert_eq!(err.code, "price_unit");
        assert!(validate_price(&Decimal::new(1_000_050, 2)).is_err());
    }

    #[test]
    fn price_out_of_range_rejected() {
        assert_eq!(validate_price(&Decimal::from(-100)).unwrap_err().code, "price_range");
        assert_eq!(
            validate_price(&(MAX_PRICE + PRICE_UNIT)).unwrap_err().code,
            "price_range"
        );
        assert!(validate_price(&MAX_PRICE).is_ok());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let changes = ProductChanges {
            name: None,
            description: None,
            price: None,
            version: 0,
        };
        assert!(changes.validate().is_ok());

        let changes = ProductChanges {
            price: Some(Decimal::from(150)),
            ..changes
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ProductStatus::Active,
            ProductStatus::Inactive,
            ProductStatus::SoldOut,
            ProductStatus::Deleted,
        ] {
            assert_eq!(status.as_str().parse::<ProductStatus>(), Ok(status));
        }
        assert!("GONE".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_value(ProductStatus::SoldOut).unwrap();
        assert_eq!(json, "SOLD_OUT");
    }
}
