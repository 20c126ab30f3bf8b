//! Handlers for the `/products` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::product::{NewProduct, ProductChanges};

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::acting_user::ActingUser;
use crate::query::ProductListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/products
///
/// Register a new product. Initial stock, if any, is recorded in the stock history.
pub async fn create(
    State(state): State<AppState>,
    user: ActingUser,
    AppJson(input): AppJson<NewProduct>,
) -> AppResult<impl IntoResponse> {
    tracing::debug!(
        user_id = user.user_id,
        product_code = %input.product_code,
        "Create product request"
    );
    let product = state.products.create_product(&input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// GET /api/v1/products?page=&size=&category_id=&keyword=&min_price=&max_price=
///
/// List active products, newest first.
pub async fn list(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProductListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .products
        .list_products(&params.filter(), params.page_request())
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/products/{code}
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let product = state.products.get_product(&code).await?;
    Ok(Json(DataResponse { data: product }))
}

/// PUT /api/v1/products/{code}
///
/// Partial edit guarded by the `version` in the body. Only the seller may edit.
pub async fn update(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: ActingUser,
    AppJson(changes): AppJson<ProductChanges>,
) -> AppResult<impl IntoResponse> {
    let product = state
        .products
        .update_product(&code, &changes, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/products/{code}
///
/// Soft-delete. Only the seller may delete.
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
    user: ActingUser,
) -> AppResult<StatusCode> {
    state.products.delete_product(&code, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
