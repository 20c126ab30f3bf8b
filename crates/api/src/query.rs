//! Shared query parameter types for API handlers.

use catalog_core::paging::{PageRequest, ProductFilter};
use catalog_core::types::DbId;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Page parameters (`?page=&size=`). Out-of-range values are clamped.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub category_id: Option<DbId>,
    pub keyword: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }

    /// Blank keywords are treated as absent.
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: self.category_id,
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}
