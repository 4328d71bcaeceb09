//! # Inventory Repository
//!
//! Reads and writes of the `inventory` collection.
//!
//! ## Key Operations
//! - Full listing ordered by id (inventory table)
//! - Narrow listing ordered by name (sales view product picker)
//! - Insert / partial update / delete
//! - Stock level writes (sale decrement, reconciliation)

use std::sync::Arc;

use tracing::debug;

use stockroom_core::{InventoryItem, InventoryOption, InventoryPatch, NewInventoryItem};

use crate::error::{StoreError, StoreResult};
use crate::store::{from_record, from_records, to_record, Collection, OrderBy, Query, RecordStore};

/// Repository for inventory rows.
///
/// ## Usage
/// ```rust,ignore
/// let repo = InventoryRepository::new(store.clone());
///
/// let item = repo.insert(&new_item).await?;
/// repo.set_quantity(item.id, 7).await?;
/// ```
#[derive(Clone)]
pub struct InventoryRepository {
    store: Arc<dyn RecordStore>,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        InventoryRepository { store }
    }

    /// Lists every item, ordered by id.
    pub async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = self
            .store
            .list(Collection::Inventory, &Query::ordered(OrderBy::asc("id")))
            .await?;
        from_records(rows)
    }

    /// Lists the sales view projection, ordered by product name.
    pub async fn list_for_sale(&self) -> StoreResult<Vec<InventoryOption>> {
        let query =
            Query::ordered(OrderBy::asc("product_name")).select(InventoryOption::COLUMNS);
        let rows = self.store.list(Collection::Inventory, &query).await?;
        from_records(rows)
    }

    /// Gets an item by id.
    ///
    /// ## Returns
    /// * `Ok(Some(item))` - Item found
    /// * `Ok(None)` - No such row
    pub async fn get(&self, id: i64) -> StoreResult<Option<InventoryItem>> {
        match self.store.get(Collection::Inventory, id).await? {
            Some(row) => Ok(Some(from_record(row)?)),
            None => Ok(None),
        }
    }

    /// Inserts a new item and returns it with its backend-assigned id.
    pub async fn insert(&self, item: &NewInventoryItem) -> StoreResult<InventoryItem> {
        debug!(product_name = %item.product_name, "Inserting inventory item");
        let row = self
            .store
            .insert(Collection::Inventory, to_record(item)?)
            .await?;
        from_record(row)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: i64, patch: &InventoryPatch) -> StoreResult<InventoryItem> {
        debug!(id, ?patch, "Updating inventory item");
        let row = self
            .store
            .update(Collection::Inventory, id, to_record(patch)?)
            .await?;
        from_record(row)
    }

    /// Writes an absolute stock level.
    ///
    /// The write has landed once the backend hands back the affected row, so
    /// that row is not decoded. No affected row is `NotFound`.
    pub async fn set_quantity(&self, id: i64, quantity: i64) -> StoreResult<()> {
        debug!(id, quantity, "Setting stock level");
        self.store
            .update(
                Collection::Inventory,
                id,
                to_record(&InventoryPatch::quantity(quantity))?,
            )
            .await?;
        Ok(())
    }

    /// Deletes an item. Sales that reference it are left as they are.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        debug!(id, "Deleting inventory item");
        self.store.delete(Collection::Inventory, id).await
    }

    /// Gets an item that must exist.
    pub async fn require(&self, id: i64) -> StoreResult<InventoryItem> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(Collection::Inventory.name(), id))
    }
}
