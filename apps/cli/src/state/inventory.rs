//! # Inventory View
//!
//! The client's most recent fetch of the inventory projection. Sale
//! preconditions are checked against it, so it may be stale relative to
//! the backend.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refresh() ──► list_for_sale() ──► replace(rows)                       │
//! │                                                                         │
//! │  record_sale ──► snapshot() ──► plan_sale(view, ...)                   │
//! │             └──► refresh() after success or partial failure            │
//! │                                                                         │
//! │  add / update / delete item ──► refresh()                              │
//! │                                                                         │
//! │  NOTE: writers take the lock only to swap the vector; no lock is held  │
//! │        across a backend request.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use stockroom_core::InventoryOption;
use stockroom_store::{InventoryRepository, StoreResult};

/// Shared, possibly stale, inventory view.
#[derive(Debug, Clone, Default)]
pub struct InventoryView {
    rows: Arc<RwLock<Vec<InventoryOption>>>,
}

impl InventoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refetches the projection and swaps it in.
    pub async fn refresh(&self, repo: &InventoryRepository) -> StoreResult<Vec<InventoryOption>> {
        let rows = repo.list_for_sale().await?;
        debug!(count = rows.len(), "Inventory view refreshed");
        self.replace(rows.clone()).await;
        Ok(rows)
    }

    /// Swaps in a new projection.
    pub async fn replace(&self, rows: Vec<InventoryOption>) {
        *self.rows.write().await = rows;
    }

    /// Copy of the current projection.
    pub async fn snapshot(&self) -> Vec<InventoryOption> {
        self.rows.read().await.clone()
    }

    /// Looks up one product in the view.
    pub async fn find(&self, product_id: i64) -> Option<InventoryOption> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id == product_id)
            .cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}
