use axum::routing::{get, post};
use axum::Router;

use crate::handlers::stock;
use crate::state::AppState;

/// Routes mounted at `/stock`.
///
/// ```text
/// POST   /{code}/adjust     -> adjust
/// GET    /{code}/history    -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{code}/adjust", post(stock::adjust))
        .route("/{code}/history", get(stock::history))
}
