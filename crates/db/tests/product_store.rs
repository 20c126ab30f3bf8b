//! Integration tests for the PostgreSQL product store.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p catalog-db -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use catalog_core::error::CoreError;
use catalog_core::paging::{PageRequest, ProductFilter};
use catalog_core::product::{NewProduct, ProductChanges, ProductStatus};
use catalog_core::service::ProductService;
use catalog_core::stock::{AdjustmentType, NewStockHistory, StockAdjustmentRequest};
use catalog_core::store::{ProductStore, StoreError};
use catalog_db::repositories::StockHistoryRepo;
use catalog_db::PgProductStore;
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_product(code: &str, stock: i32) -> NewProduct {
    NewProduct {
        product_code: code.to_string(),
        name: "Walnut Desk".to_string(),
        description: Some("store test".to_string()),
        price: Decimal::from(10_000),
        stock,
        seller_id: 1,
        category_id: 5,
    }
}

fn adjustment(kind: &str, quantity: i32) -> StockAdjustmentRequest {
    StockAdjustmentRequest {
        adjustment_type: kind.to_string(),
        quantity,
        reason: None,
    }
}

fn service(pool: &PgPool, lock_wait: Duration) -> ProductService {
    ProductService::new(Arc::new(PgProductStore::new(pool.clone(), lock_wait)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_writes_initial_history(pool: PgPool) {
    let products = service(&pool, Duration::from_secs(5));

    let created = products.create_product(&new_product("PRD-100001", 30)).await.unwrap();
    assert_eq!(created.version, 0);
    assert_eq!(created.status, ProductStatus::Active);

    let history = products
        .stock_history("PRD-100001", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(history.total_elements, 1);
    assert_eq!(history.content[0].previous_stock, 0);
    assert_eq!(history.content[0].current_stock, 30);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_is_rejected_by_constraint(pool: PgPool) {
    let store = PgProductStore::new(pool.clone(), Duration::from_secs(5));
    store.insert(&new_product("PRD-100002", 0), None).await.unwrap();

    let second = store.insert(&new_product("PRD-100002", 0), None).await;
    assert_matches!(second, Err(StoreError::Duplicate(c)) if c == "uq_products_product_code");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_stale_version_is_rejected(pool: PgPool) {
    let products = service(&pool, Duration::from_secs(5));
    products.create_product(&new_product("PRD-100003", 0)).await.unwrap();

    let changes = ProductChanges {
        name: Some("Oak Desk".to_string()),
        description: None,
        price: None,
        version: 0,
    };
    let edited = products.update_product("PRD-100003", &changes, 1).await.unwrap();
    assert_eq!(edited.version, 1);

    let stale = products.update_product("PRD-100003", &changes, 1).await;
    assert_matches!(stale, Err(CoreError::VersionConflict { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_decrements_never_oversell(pool: PgPool) {
    let products = service(&pool, Duration::from_secs(5));
    products.create_product(&new_product("PRD-100004", 30)).await.unwrap();

    let first = adjustment("DECREASE", 20);
    let second = adjustment("DECREASE", 20);
    let (a, b) = tokio::join!(
        products.adjust_stock("PRD-100004", &first, 2),
        products.adjust_stock("PRD-100004", &second, 3),
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CoreError::InsufficientStock { current_stock: 10, .. }))));

    let product = products.get_product("PRD-100004").await.unwrap();
    assert_eq!(product.stock, 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_lock_wait_times_out(pool: PgPool) {
    let store = PgProductStore::new(pool.clone(), Duration::from_millis(100));
    store.insert(&new_product("PRD-100005", 5), None).await.unwrap();

    let held = store.fetch_for_exclusive_update("PRD-100005").await.unwrap();
    assert!(held.is_some());

    let waiting = store.fetch_for_exclusive_update("PRD-100005").await;
    assert!(matches!(waiting, Err(StoreError::LockTimeout)));

    drop(held);
    let retried = store.fetch_for_exclusive_update("PRD-100005").await.unwrap();
    assert!(retried.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_deleted_product_is_hidden(pool: PgPool) {
    let products = service(&pool, Duration::from_secs(5));
    products.create_product(&new_product("PRD-100006", 0)).await.unwrap();
    products.delete_product("PRD-100006", 1).await.unwrap();

    assert_matches!(
        products.get_product("PRD-100006").await,
        Err(CoreError::NotFound { .. })
    );
    let listed = products
        .list_products(&ProductFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(listed.content.iter().all(|p| p.product_code != "PRD-100006"));

    let store = PgProductStore::new(pool.clone(), Duration::from_secs(5));
    assert!(store.exists("PRD-100006").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_list_filters_by_keyword_and_price(pool: PgPool) {
    let products = service(&pool, Duration::from_secs(5));
    let mut lamp = new_product("PRD-100007", 0);
    lamp.name = "Brass Lamp".to_string();
    lamp.price = Decimal::from(3_000);
    products.create_product(&lamp).await.unwrap();
    products.create_product(&new_product("PRD-100008", 0)).await.unwrap();

    let filter = ProductFilter {
        keyword: Some("lamp".to_string()),
        max_price: Some(Decimal::from(5_000)),
        ..ProductFilter::default()
    };
    let page = products.list_products(&filter, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].product_code, "PRD-100007");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_history_follows_write_order_not_transaction_start(pool: PgPool) {
    let store = PgProductStore::new(pool.clone(), Duration::from_secs(5));
    store.insert(&new_product("PRD-100009", 10), None).await.unwrap();

    let entry = |previous: i32, current: i32| NewStockHistory {
        product_code: "PRD-100009".to_string(),
        adjustment_type: AdjustmentType::Increase,
        quantity: current - previous,
        previous_stock: previous,
        current_stock: current,
        reason: None,
        adjusted_by: 1,
    };

    // Opened first, written last.
    let mut late = pool.begin().await.unwrap();
    sqlx::query("SELECT 1").execute(&mut *late).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut early = pool.begin().await.unwrap();
    StockHistoryRepo::append(&mut *early, &entry(10, 11)).await.unwrap();
    early.commit().await.unwrap();

    StockHistoryRepo::append(&mut *late, &entry(11, 12)).await.unwrap();
    late.commit().await.unwrap();

    let history = store
        .history("PRD-100009", PageRequest::default())
        .await
        .unwrap();
    let currents: Vec<i32> = history.content.iter().map(|h| h.current_stock).collect();
    assert_eq!(currents, vec![12, 11]);
}
