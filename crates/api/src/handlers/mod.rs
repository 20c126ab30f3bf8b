pub mod product;
pub mod stock;
