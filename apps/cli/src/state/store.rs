//! # Store State
//!
//! The record store and the repositories built over it, plus the sale
//! settings the workflow reads.

use std::sync::Arc;

use stockroom_store::{
    InventoryRepository, MemoryStore, RecordStore, SaleRepository, SalesSettings,
};

/// Backend access for commands.
#[derive(Clone)]
pub struct StoreState {
    inventory: InventoryRepository,
    sales: SaleRepository,
    settings: SalesSettings,
}

impl StoreState {
    /// Builds the repositories over `store`.
    pub fn new(store: Arc<dyn RecordStore>, settings: SalesSettings) -> Self {
        StoreState {
            inventory: InventoryRepository::new(store.clone()),
            sales: SaleRepository::new(store),
            settings,
        }
    }

    /// In-memory backend with default sale settings.
    pub fn memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Self::new(store.clone(), SalesSettings::default()), store)
    }

    pub fn inventory(&self) -> &InventoryRepository {
        &self.inventory
    }

    pub fn sales(&self) -> &SaleRepository {
        &self.sales
    }

    pub fn settings(&self) -> &SalesSettings {
        &self.settings
    }

    /// Replaces the sale settings.
    pub fn with_settings(mut self, settings: SalesSettings) -> Self {
        self.settings = settings;
        self
    }
}
