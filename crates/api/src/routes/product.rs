//! Route definitions for products.

use axum::routing::get;
use axum::Router;

use crate::handlers::product;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /{code}    -> get_by_code
/// PUT    /{code}    -> update
/// DELETE /{code}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(product::list).post(product::create))
        .route(
            "/{code}",
            get(product::get_by_code)
                .put(product::update)
                .delete(product::delete),
        )
}
