//! Catalog domain core.
//!
//! Pure product and stock rules (adjustment engine, ownership and edit
//! guards), the store traits the service layer talks to, and the
//! [`service::ProductService`] that orchestrates them. No database
//! dependencies live here; see `catalog-db` for the PostgreSQL store.

pub mod edit;
pub mod error;
pub mod ownership;
pub mod paging;
pub mod product;
pub mod service;
pub mod stock;
pub mod store;
pub mod types;
