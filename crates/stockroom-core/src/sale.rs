//! # Sale Planning
//!
//! The local half of recording a sale: precondition checks against the
//! client's inventory view and the payloads of the two writes that follow.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_sale(view, request, now)          ← pure, no requests            │
//! │       │                                                                 │
//! │       ├── quantity <= 0 ────────────► MustBePositive                   │
//! │       ├── product not in view ──────► ProductNotInView                 │
//! │       ├── quantity > view stock ────► ExceedsStock                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalePlan                                                              │
//! │   ├── sale: NewSale { price = view price (snapshot), sale_date = now } │
//! │   └── remaining_quantity = view stock - quantity                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The view may be stale. A plan only says the sale looked valid against the
//! last fetch; the backend still has the final word.

use chrono::{DateTime, Utc};

use crate::error::{ValidationError, ValidationResult};
use crate::forms::SaleRequest;
use crate::types::{InventoryOption, NewSale};
use crate::validation::validate_sale_quantity;

/// The checked outcome of a sale request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    /// Row to insert into the sales collection.
    pub sale: NewSale,

    /// Name of the product at planning time (for logs and messages).
    pub product_name: String,

    /// Stock the view showed when the plan was made.
    pub available: i64,

    /// Stock level to write after the insert succeeds.
    pub remaining_quantity: i64,
}

/// Checks a sale request against the inventory view and builds the writes.
///
/// ## Example
/// ```rust
/// use stockroom_core::forms::SaleRequest;
/// use stockroom_core::sale::plan_sale;
/// use stockroom_core::{InventoryOption, Money, ValidationError};
///
/// let view = vec![InventoryOption {
///     id: 1,
///     product_name: "Widget".to_string(),
///     quantity: 10,
///     price: Money::from_cents(500),
/// }];
///
/// let err = plan_sale(&view, SaleRequest::new(1, 11), chrono::Utc::now()).unwrap_err();
/// assert_eq!(err.to_string(), "Quantity exceeds available inventory.");
/// ```
pub fn plan_sale(
    view: &[InventoryOption],
    request: SaleRequest,
    now: DateTime<Utc>,
) -> ValidationResult<SalePlan> {
    validate_sale_quantity(request.quantity)?;

    let item = view
        .iter()
        .find(|item| item.id == request.product_id)
        .ok_or(ValidationError::ProductNotInView {
            product_id: request.product_id,
        })?;

    if request.quantity > item.quantity {
        return Err(ValidationError::ExceedsStock {
            requested: request.quantity,
            available: item.quantity,
        });
    }

    Ok(SalePlan {
        sale: NewSale {
            product_id: item.id,
            quantity: request.quantity,
            price: item.price,
            sale_date: now,
        },
        product_name: item.product_name.clone(),
        available: item.quantity,
        remaining_quantity: item.quantity - request.quantity,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
