//! Handlers for the `/stock` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::stock::StockAdjustmentRequest;

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::acting_user::ActingUser;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/stock/{code}/adjust
///
/// Apply an INCREASE, DECREASE or CORRECTION under the product's row lock.
/// Returns the product as committed.
pub async fn adjust(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: ActingUser,
    AppJson(request): AppJson<StockAdjustmentRequest>,
) -> AppResult<impl IntoResponse> {
    let product = state
        .products
        .adjust_stock(&code, &request, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: product }))
}

/// GET /api/v1/stock/{code}/history?page=&size=
pub async fn history(
    State(state): State<AppState>,
    Path(code): Path<String>,
    AppQuery(params): AppQuery<PageParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .products
        .stock_history(&code, params.to_request())
        .await?;
    Ok(Json(DataResponse { data: page }))
}
