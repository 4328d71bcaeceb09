//! # Validation Module
//!
//! Field-level checks run before a payload is sent.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form parsing (forms.rs)                                      │
//! │  ├── Empty fields, non-numeric input                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Ranges, lengths, formats                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  ├── UNIQUE (product_name)                                             │
//! │  ├── FOREIGN KEY (sales.product_id)                                    │
//! │  └── Row-level permissions                                             │
//! │                                                                         │
//! │  Layer 3 is authoritative; layers 1-2 only save a round trip.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{InventoryPatch, NewInventoryItem};
use crate::MIN_PASSWORD_LEN;

const MAX_PRODUCT_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ```rust
/// use stockroom_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Widget").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("product_name"));
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "product_name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address for sign-up and sign-in.
///
/// Only the shape is checked (`local@domain`); the auth provider decides the
/// rest.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        }),
    }
}

/// Validates a password for sign-up.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being sold.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// The upper bound is the stock in the inventory view, checked by
/// [`crate::sale::plan_sale`].
pub fn validate_sale_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price or cost. Zero is allowed (free items).
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a supplier reference.
pub fn validate_supplier_id(id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "supplier_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a complete insert payload.
pub fn validate_new_item(item: &NewInventoryItem) -> ValidationResult<()> {
    validate_product_name(&item.product_name)?;
    validate_stock_level(item.quantity)?;
    validate_amount("price", item.price)?;
    validate_amount("cost", item.cost)?;
    validate_supplier_id(item.supplier_id)?;
    Ok(())
}

/// Validates the fields present in a partial update.
pub fn validate_patch(patch: &InventoryPatch) -> ValidationResult<()> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    if let Some(name) = &patch.product_name {
        validate_product_name(name)?;
    }
    if let Some(quantity) = patch.quantity {
        validate_stock_level(quantity)?;
    }
    if let Some(price) = patch.price {
        validate_amount("price", price)?;
    }
    if let Some(cost) = patch.cost {
        validate_amount("cost", cost)?;
    }
    if let Some(supplier_id) = patch.supplier_id {
        validate_supplier_id(supplier_id)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
