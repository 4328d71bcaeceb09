//! # Inventory Commands
//!
//! Listing, adding, editing and deleting inventory items. Each write
//! refreshes the inventory view afterwards.

use tracing::{debug, info, warn};

use stockroom_core::{InventoryForm, InventoryItem};

use crate::error::ApiError;
use crate::state::{InventoryView, StoreState};

/// Lists every item, ordered by id.
pub async fn list_items(store: &StoreState) -> Result<Vec<InventoryItem>, ApiError> {
    debug!("list_items command");
    Ok(store.inventory().list().await?)
}

/// Adds an item from the inventory form.
///
/// ## Errors
/// - any of name, quantity, price, cost blank → VALIDATION
/// - name already used → CONSTRAINT
/// - backend refuses the insert → PERMISSION
pub async fn add_item(
    store: &StoreState,
    view: &InventoryView,
    form: &InventoryForm,
) -> Result<InventoryItem, ApiError> {
    debug!("add_item command");
    let new_item = form.into_new_item()?;

    let item = store.inventory().insert(&new_item).await?;
    refresh(store, view).await;

    info!(id = item.id, product_name = %item.product_name, "Inventory item added");
    Ok(item)
}

/// Applies the non-blank fields of the form to an item.
pub async fn update_item(
    store: &StoreState,
    view: &InventoryView,
    id: i64,
    form: &InventoryForm,
) -> Result<InventoryItem, ApiError> {
    debug!(id, "update_item command");
    let patch = form.into_patch()?;

    let item = store.inventory().update(id, &patch).await?;
    refresh(store, view).await;

    info!(id, "Inventory item updated");
    Ok(item)
}

/// Deletes an item. Recorded sales keep their product reference and price.
pub async fn delete_item(
    store: &StoreState,
    view: &InventoryView,
    id: i64,
) -> Result<(), ApiError> {
    debug!(id, "delete_item command");
    store.inventory().delete(id).await?;
    refresh(store, view).await;

    info!(id, "Inventory item deleted");
    Ok(())
}

async fn refresh(store: &StoreState, view: &InventoryView) {
    if let Err(e) = view.refresh(store.inventory()).await {
        warn!(error = %e, "Inventory refresh failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, DUPLICATE_NAME_MESSAGE, PERMISSION_MESSAGE};
    use stockroom_core::Money;
    use stockroom_store::{Collection, Operation};

    fn form(name: &str, quantity: &str) -> InventoryForm {
        InventoryForm {
            product_name: Some(name.to_string()),
            quantity: Some(quantity.to_string()),
            price: Some("5.00".to_string()),
            cost: Some("3.10".to_string()),
            supplier_id: None,
        }
    }

    #[tokio::test]
    async fn test_add_update_delete() {
        let (store, _) = StoreState::memory();
        let view = InventoryView::new();

        let item = add_item(&store, &view, &form("Widget", "10")).await.unwrap();
        assert_eq!(item.price, Money::from_cents(500));
        assert_eq!(item.supplier_id, 1);
        assert_eq!(view.find(item.id).await.map(|o| o.quantity), Some(10));

        let patch = InventoryForm {
            quantity: Some("12".to_string()),
            ..Default::default()
        };
        let item = update_item(&store, &view, item.id, &patch).await.unwrap();
        assert_eq!(item.quantity, 12);
        assert_eq!(item.product_name, "Widget");

        delete_item(&store, &view, item.id).await.unwrap();
        assert!(list_items(&store).await.unwrap().is_empty());
        assert!(view.is_empty().await);

        let err = delete_item(&store, &view, item.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let (store, memory) = StoreState::memory();
        let view = InventoryView::new();

        let mut incomplete = form("Widget", "10");
        incomplete.cost = None;
        let err = add_item(&store, &view, &incomplete).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(
            err.message,
            "Product name, quantity, price, and cost are required."
        );
        assert_eq!(memory.write_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_and_denied() {
        let (store, memory) = StoreState::memory();
        let view = InventoryView::new();
        add_item(&store, &view, &form("Widget", "10")).await.unwrap();

        let err = add_item(&store, &view, &form("Widget", "1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Constraint);
        assert_eq!(err.message, DUPLICATE_NAME_MESSAGE);

        memory.deny(Collection::Inventory, Operation::Insert).await;
        let err = add_item(&store, &view, &form("Gadget", "1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Permission);
        assert_eq!(err.message, PERMISSION_MESSAGE);
    }
}
