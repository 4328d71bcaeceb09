//! # stockroom-store: Record Store Client for Stockroom
//!
//! Read/insert/update/delete access to the `inventory` and `sales`
//! collections of a hosted relational backend, plus the auth provider client.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Sale workflow / inventory commands (apps/cli)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Repositories  │    │  RecordStore  │    │    Auth      │  │   │
//! │  │   │               │    │   (trait)     │    │              │  │   │
//! │  │   │ InventoryRepo │───►│  RestStore    │    │  AuthClient  │  │   │
//! │  │   │ SaleRepo      │    │  MemoryStore  │    │  MemoryAuth  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────┬───────┘  │   │
//! │  │                                │                   │          │   │
//! │  └────────────────────────────────┼───────────────────┼──────────┘   │
//! │                                   ▼                   ▼              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   Hosted backend: /rest/v1/<collection>   /auth/v1/...          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - `RecordStore` trait, collections, queries
//! - [`rest`] - HTTPS backend
//! - [`memory`] - in-process backend with the same constraints
//! - [`repository`] - typed access to inventory and sales
//! - [`auth`] - sign-up / sign-in / sign-out and the auth state observable
//! - [`config`] - connection and sale-mode configuration
//! - [`error`] - backend error classification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockroom_store::{InventoryRepository, RestStore, StoreConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let store = Arc::new(RestStore::new(&config.backend)?);
//! let items = InventoryRepository::new(store).list().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod memory;
pub mod repository;
pub mod rest;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthClient, AuthProvider, AuthState, MemoryAuth, Session, SignUpOutcome, User};
pub use config::{BackendSettings, SaleMode, SalesSettings, StoreConfig};
pub use error::{AuthError, AuthResult, ConfigError, StoreError, StoreErrorKind, StoreResult};
pub use memory::{MemoryStore, Operation};
pub use repository::inventory::InventoryRepository;
pub use repository::sale::SaleRepository;
pub use rest::RestStore;
pub use store::{Collection, OrderBy, Query, Record, RecordStore};
