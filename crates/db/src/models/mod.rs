pub mod product;
pub mod stock_history;
