//! # Domain Types
//!
//! Row types of the two collections, their write payloads, and the
//! projections the views read.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐                    ┌─────────────────┐            │
//! │  │  InventoryItem  │  ◄── product_id ── │      Sale       │            │
//! │  │  ─────────────  │                    │  ─────────────  │            │
//! │  │  id (backend)   │                    │  id (backend)   │            │
//! │  │  product_name ◆ │                    │  product_id     │            │
//! │  │  quantity       │                    │  quantity       │            │
//! │  │  price, cost    │                    │  price (frozen) │            │
//! │  │  supplier_id    │                    │  sale_date      │            │
//! │  └─────────────────┘                    └─────────────────┘            │
//! │    ◆ unique (backend constraint)                                        │
//! │                                                                         │
//! │  Write payloads:  NewInventoryItem, InventoryPatch, NewSale            │
//! │  Projections:     InventoryOption (sales view), SaleLine (table row)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Identifiers are integers assigned by the backend on insert. Payload types
//! therefore carry no `id` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Inventory
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    /// Backend-assigned identifier.
    pub id: i64,

    /// Display name, unique across the inventory.
    pub product_name: String,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Unit selling price.
    #[ts(type = "number")]
    pub price: Money,

    /// Unit cost.
    #[ts(type = "number")]
    pub cost: Money,

    /// Supplier reference.
    pub supplier_id: i64,
}

/// Insert payload for a new inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInventoryItem {
    pub product_name: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub price: Money,
    #[ts(type = "number")]
    pub cost: Money,
    pub supplier_id: i64,
}

impl NewInventoryItem {
    /// Attaches the backend-assigned identifier.
    pub fn with_id(self, id: i64) -> InventoryItem {
        InventoryItem {
            id,
            product_name: self.product_name,
            quantity: self.quantity,
            price: self.price,
            cost: self.cost,
            supplier_id: self.supplier_id,
        }
    }
}

/// Partial update of an inventory row. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
}

impl InventoryPatch {
    /// Patch that only sets the stock level.
    pub fn quantity(quantity: i64) -> Self {
        InventoryPatch {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.cost.is_none()
            && self.supplier_id.is_none()
    }

}

/// Narrow projection of an inventory row used by the sales view.
///
/// Selected as `id, product_name, quantity, price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryOption {
    pub id: i64,
    pub product_name: String,
    pub quantity: i64,
    #[ts(type = "number")]
    pub price: Money,
}

impl InventoryOption {
    /// Column list for the projection.
    pub const COLUMNS: &'static str = "id,product_name,quantity,price";

    /// Label shown in the product picker: `Widget - $5.00 (Available: 10)`.
    pub fn label(&self) -> String {
        format!(
            "{} - {} (Available: {})",
            self.product_name, self.price, self.quantity
        )
    }
}

impl From<&InventoryItem> for InventoryOption {
    fn from(item: &InventoryItem) -> Self {
        InventoryOption {
            id: item.id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price,
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A recorded sale. Immutable once created.
///
/// `price` is the unit price copied from the inventory row at sale time; it
/// is never re-derived from the current row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[ts(type = "number")]
    pub price: Money,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Line total (`quantity × price`).
    #[inline]
    pub fn total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// Insert payload for a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub product_id: i64,
    pub quantity: i64,
    #[ts(type = "number")]
    pub price: Money,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

/// A row of the sales table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub sale_id: i64,
    /// Resolved from the inventory view; `None` once the product is deleted.
    pub product_name: Option<String>,
    pub quantity: i64,
    #[ts(type = "number")]
    pub price: Money,
    #[ts(type = "number")]
    pub total: Money,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

impl SaleLine {
    /// Builds table rows, resolving product names against `inventory`.
    pub fn build(sales: &[Sale], inventory: &[InventoryOption]) -> Vec<SaleLine> {
        sales
            .iter()
            .map(|sale| SaleLine {
                sale_id: sale.id,
                product_name: inventory
                    .iter()
                    .find(|item| item.id == sale.product_id)
                    .map(|item| item.product_name.clone()),
                quantity: sale.quantity,
                price: sale.price,
                total: sale.total(),
                sale_date: sale.sale_date,
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
