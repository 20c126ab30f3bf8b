pub mod health;
pub mod product;
pub mod stock;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /products                      list, create
/// /products/{code}               get, update, delete
///
/// /stock/{code}/adjust           adjust stock (POST)
/// /stock/{code}/history          stock history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product::router())
        .nest("/stock", stock::router())
}
