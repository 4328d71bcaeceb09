//! # Repository Module
//!
//! Typed access to the two collections over any [`RecordStore`].
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command (apps/cli)                                                    │
//! │       │                                                                 │
//! │       │  inventory.list_for_sale()                                     │
//! │       ▼                                                                 │
//! │  InventoryRepository / SaleRepository                                  │
//! │       │  typed rows ⇄ Record (serde_json)                              │
//! │       ▼                                                                 │
//! │  Arc<dyn RecordStore>   (RestStore or MemoryStore)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`] - inventory CRUD and stock level writes
//! - [`SaleRepository`] - sale history and inserts
//!
//! [`RecordStore`]: crate::store::RecordStore
//! [`InventoryRepository`]: inventory::InventoryRepository
//! [`SaleRepository`]: sale::SaleRepository

pub mod inventory;
pub mod sale;
