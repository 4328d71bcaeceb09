//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! Row types, money, form parsing, validation and sale planning, all as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/cli (stockroom)                         │   │
//! │  │    inventory list/add ──► sales record ──► register/logout      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   forms   │  │   sale    │  │   │
//! │  │   │ Inventory │  │   Money   │  │  parsing  │  │ plan_sale │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │  checks   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockroom-store (Record Store Client)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Row types (InventoryItem, Sale, payloads and projections)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Validation error type
//! - [`validation`] - Field-level checks
//! - [`forms`] - Raw form input → validated payloads
//! - [`sale`] - Sale precondition checks against an inventory view
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::forms::SaleRequest;
//! use stockroom_core::money::Money;
//! use stockroom_core::sale::plan_sale;
//! use stockroom_core::types::InventoryOption;
//!
//! let view = vec![InventoryOption {
//!     id: 1,
//!     product_name: "Widget".to_string(),
//!     quantity: 10,
//!     price: Money::from_cents(500),
//! }];
//!
//! let plan = plan_sale(&view, SaleRequest::new(1, 3), chrono::Utc::now()).unwrap();
//! assert_eq!(plan.sale.price, Money::from_cents(500));
//! assert_eq!(plan.remaining_quantity, 7);
//! ```

pub mod error;
pub mod forms;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationResult};
pub use forms::{InventoryForm, SaleForm, SaleRequest};
pub use money::Money;
pub use sale::{plan_sale, SalePlan};
pub use types::*;

/// Supplier assigned to new items when the form leaves the field empty.
pub const DEFAULT_SUPPLIER_ID: i64 = 1;

/// Minimum password length accepted by the auth provider.
pub const MIN_PASSWORD_LEN: usize = 6;
