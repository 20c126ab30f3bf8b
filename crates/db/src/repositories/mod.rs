//! Repository layer: one zero-sized struct per table.

pub mod product_repo;
pub mod stock_history_repo;

pub use product_repo::ProductRepo;
pub use stock_history_repo::StockHistoryRepo;
