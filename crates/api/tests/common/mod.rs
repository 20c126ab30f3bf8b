#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use catalog_core::service::ProductService;
use catalog_core::store::InMemoryProductStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_api::config::ServerConfig;
use catalog_api::router::build_app_router;
use catalog_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        lock_wait_timeout_ms: 5_000,
        db_max_connections: 5,
    }
}

/// Build the full application router over a fresh in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with_store(Arc::new(InMemoryProductStore::default()))
}

/// Build the full application router over the given store, so tests can
/// reach around the HTTP surface (e.g. to hold a row lock).
pub fn build_test_app_with_store(store: Arc<InMemoryProductStore>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        products: ProductService::new(store),
        pool: None,
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, user_id: Option<i64>, body: Value) -> Response {
    send(app, Method::POST, uri, user_id, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, user_id: Option<i64>, body: Value) -> Response {
    send(app, Method::PUT, uri, user_id, Some(body)).await
}

pub async fn delete(app: Router, uri: &str, user_id: Option<i64>) -> Response {
    send(app, Method::DELETE, uri, user_id, None).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A valid create-product body.
pub fn product_body(code: &str, seller_id: i64, stock: i32) -> Value {
    json!({
        "product_code": code,
        "name": "Walnut Desk",
        "description": "Solid walnut, 140cm",
        "price": 250000,
        "stock": stock,
        "seller_id": seller_id,
        "category_id": 10,
    })
}

/// Create a product through the API and return its JSON representation.
pub async fn create_product(app: &Router, code: &str, seller_id: i64, stock: i32) -> Value {
    let response = post_json(
        app.clone(),
        "/api/v1/products",
        Some(seller_id),
        product_body(code, seller_id, stock),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
