//! End-to-end command tests over the in-memory backend.

use std::sync::Arc;

use stockroom_cli::commands::{auth, inventory, sale};
use stockroom_cli::error::{ErrorCode, SaleError, DUPLICATE_NAME_MESSAGE, PERMISSION_MESSAGE};
use stockroom_cli::routes::{self, Route};
use stockroom_cli::state::{InventoryView, SessionState, StoreState};
use stockroom_cli::App;
use stockroom_core::{InventoryForm, Money, SaleForm, SaleRequest};
use stockroom_store::{
    AuthState, Collection, MemoryAuth, MemoryStore, Operation, SaleMode, SalesSettings,
    StoreConfig,
};

fn widget_form() -> InventoryForm {
    InventoryForm {
        product_name: Some("Widget".to_string()),
        quantity: Some("10".to_string()),
        price: Some("5.00".to_string()),
        cost: Some("3.10".to_string()),
        supplier_id: None,
    }
}

async fn shop() -> (StoreState, InventoryView, Arc<MemoryStore>, i64) {
    let (store, memory) = StoreState::memory();
    let view = InventoryView::new();
    let item = inventory::add_item(&store, &view, &widget_form())
        .await
        .unwrap();
    (store, view, memory, item.id)
}

async fn stock(store: &StoreState, id: i64) -> i64 {
    store.inventory().require(id).await.unwrap().quantity
}

#[tokio::test]
async fn sale_decrements_stock_at_view_price() {
    let (store, view, _, id) = shop().await;

    let form = SaleForm {
        product_id: Some(id.to_string()),
        quantity: Some("3".to_string()),
    };
    let recorded = sale::record_sale_form(&store, &view, &form).await.unwrap();

    assert_eq!(recorded.sale.price, Money::from_cents(500));
    assert_eq!(recorded.sale.total(), Money::from_cents(1500));
    assert_eq!(stock(&store, id).await, 7);

    let lines = sale::list_sales(&store, &view).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].sale_id, recorded.sale.id);
    assert_eq!(lines[0].product_name.as_deref(), Some("Widget"));
}

#[tokio::test]
async fn unreadable_inventory_is_reported_as_a_backend_error() {
    let (store, view, memory, id) = shop().await;
    memory.deny(Collection::Inventory, Operation::Read).await;
    let writes = memory.write_count();

    let form = SaleForm {
        product_id: Some(id.to_string()),
        quantity: Some("3".to_string()),
    };
    let err = sale::record_sale_form(&store, &view, &form).await.unwrap_err();
    let api: stockroom_cli::error::ApiError = err.into();
    assert_eq!(api.code, ErrorCode::Permission);
    assert_eq!(api.message, PERMISSION_MESSAGE);
    assert_eq!(memory.write_count(), writes);
}

#[tokio::test]
async fn oversell_is_rejected_without_writes() {
    let (store, view, memory, id) = shop().await;
    let writes = memory.write_count();

    let err = sale::record_sale(&store, &view, SaleRequest::new(id, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, SaleError::Validation(_)));
    assert_eq!(err.to_string(), "Quantity exceeds available inventory.");

    assert_eq!(memory.write_count(), writes);
    assert_eq!(stock(&store, id).await, 10);
    assert_eq!(memory.row_count(Collection::Sales).await, 0);
}

#[tokio::test]
async fn selling_entire_stock_leaves_zero() {
    let (store, view, _, id) = shop().await;
    sale::record_sale(&store, &view, SaleRequest::new(id, 10))
        .await
        .unwrap();
    assert_eq!(stock(&store, id).await, 0);

    let err = sale::record_sale(&store, &view, SaleRequest::new(id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SaleError::Validation(_)));
}

#[tokio::test]
async fn failed_decrement_is_a_partial_failure() {
    let (store, view, memory, id) = shop().await;
    memory.deny(Collection::Inventory, Operation::Update).await;

    let err = sale::record_sale(&store, &view, SaleRequest::new(id, 3))
        .await
        .unwrap_err();
    let sale_id = err.recorded_sale().map(|s| s.id).unwrap();
    assert!(err
        .to_string()
        .starts_with("Sale added but failed to update inventory:"));

    let api: stockroom_cli::error::ApiError = err.into();
    assert_eq!(api.code, ErrorCode::PartialFailure);

    assert_eq!(stock(&store, id).await, 10);
    let lines = sale::list_sales(&store, &view).await.unwrap();
    assert_eq!(lines[0].sale_id, sale_id);

    memory.allow(Collection::Inventory, Operation::Update).await;
    let item = sale::reconcile_by_id(&store, &view, sale_id).await.unwrap();
    assert_eq!(item.quantity, 7);
}

#[tokio::test]
async fn atomic_mode_never_splits_a_sale() {
    let (store, view, memory, id) = shop().await;
    let store = store.with_settings(SalesSettings {
        mode: SaleMode::Atomic,
        ..Default::default()
    });

    let recorded = sale::record_sale(&store, &view, SaleRequest::new(id, 4))
        .await
        .unwrap();
    assert_eq!(recorded.sale.quantity, 4);
    assert_eq!(stock(&store, id).await, 6);

    memory.deny(Collection::Inventory, Operation::Update).await;
    let err = sale::record_sale(&store, &view, SaleRequest::new(id, 1))
        .await
        .unwrap_err();
    assert!(err.recorded_sale().is_none());
    assert_eq!(memory.row_count(Collection::Sales).await, 1);
    assert_eq!(stock(&store, id).await, 6);
}

#[tokio::test]
async fn constraint_and_permission_errors_are_classified() {
    let (store, view, memory, _) = shop().await;

    let err = inventory::add_item(&store, &view, &widget_form())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Constraint);
    assert_eq!(err.message, DUPLICATE_NAME_MESSAGE);

    memory.deny(Collection::Sales, Operation::Insert).await;
    let id = view.snapshot().await[0].id;
    let err = sale::record_sale(&store, &view, SaleRequest::new(id, 1))
        .await
        .unwrap_err();
    let api: stockroom_cli::error::ApiError = err.into();
    assert_eq!(api.code, ErrorCode::Permission);
    assert_eq!(api.message, PERMISSION_MESSAGE);
}

#[tokio::test]
async fn deleted_product_leaves_sale_with_blank_name() {
    let (store, view, _, id) = shop().await;
    sale::record_sale(&store, &view, SaleRequest::new(id, 2))
        .await
        .unwrap();
    inventory::delete_item(&store, &view, id).await.unwrap();

    let lines = sale::list_sales(&store, &view).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_name, None);
    assert_eq!(lines[0].total, Money::from_cents(1000));
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let session = SessionState::new(Arc::new(MemoryAuth::new(true)), None);
    assert!(session.state().is_loading());
    assert_eq!(session.restore().await, AuthState::SignedOut);

    let err = routes::require(Route::Sales, &session.state()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);
    assert!(routes::require(Route::Login, &session.state()).is_ok());

    let registration = auth::register(&session, "cara@example.com", "secret1")
        .await
        .unwrap();
    assert!(matches!(
        registration,
        auth::Registration::AwaitingConfirmation { .. }
    ));
    assert!(routes::require(Route::Inventory, &session.state()).is_err());

    let app = App::demo(true).await.unwrap();
    assert!(routes::require(Route::Inventory, &app.session.state()).is_ok());
}

#[test]
fn config_file_then_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stockroom.toml");
    std::fs::write(
        &path,
        r#"
[backend]
url = "https://shop.example.com"
anon_key = "file-key"

[sales]
mode = "atomic"
"#,
    )
    .unwrap();

    let mut config = StoreConfig::from_file(&path).unwrap();
    assert_eq!(config.sales.mode, SaleMode::Atomic);
    assert_eq!(config.sales.procedure, "record_sale");
    assert_eq!(config.backend.timeout_secs, 30);

    config.apply_env_overrides_with(|key| match key {
        "STOCKROOM_ANON_KEY" => Some("env-key".to_string()),
        "STOCKROOM_SALE_MODE" => Some("two_step".to_string()),
        _ => None,
    });
    assert_eq!(config.backend.anon_key, "env-key");
    assert_eq!(config.sales.mode, SaleMode::TwoStep);
    assert!(config.validate().is_ok());
    assert!(config.backend.validate_remote().is_ok());
}
