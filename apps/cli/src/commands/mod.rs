//! # Commands Module
//!
//! Everything a user can do, as async functions over the state types.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── inventory.rs  ◄─── list / add / update / delete items
//! ├── sale.rs       ◄─── record sale, reconcile, sales table
//! └── auth.rs       ◄─── register / login / logout
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main.rs (clap)                                                        │
//! │       │  stockroom sales record --product 1 --quantity 3               │
//! │       ▼                                                                 │
//! │  routes::require(Route::Sales, session.state())                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commands::sale::record_sale_form(&store, &view, &form)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<T, ApiError>  ──►  render table, or print `[CODE] message`     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only the store
//! async fn list_items(store: &StoreState)
//!
//! // Store and view
//! async fn record_sale(store: &StoreState, view: &InventoryView, ...)
//!
//! // Only the session
//! async fn login(session: &SessionState, ...)
//! ```

pub mod auth;
pub mod inventory;
pub mod sale;
