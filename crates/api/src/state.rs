use std::sync::Arc;

use catalog_core::service::ProductService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Product catalog and stock operations.
    pub products: ProductService,
    /// Database pool, pinged by the health check. `None` when the service
    /// runs on a non-database store.
    pub pool: Option<catalog_db::DbPool>,
}
