//! # State Module
//!
//! Application state for the command layer, split into focused types so
//! each command takes only what it touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   StoreState     │  │  InventoryView   │  │   SessionState       │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  RecordStore     │  │  Arc<RwLock<     │  │  AuthProvider        │  │
//! │  │  repositories    │  │   Vec<Option>>>  │  │  session file        │  │
//! │  │  sales settings  │  │  last fetch only │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • StoreState: read-only after construction; the store is Send + Sync │
//! │  • InventoryView: async RwLock; the backend arbitrates real conflicts   │
//! │  • SessionState: auth provider publishes through a watch channel       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod inventory;
mod session;
mod store;

pub use inventory::InventoryView;
pub use session::SessionState;
pub use store::StoreState;
