//! # Form Input
//!
//! Raw text from the inventory and sales forms, turned into typed requests.
//!
//! Every field arrives as an optional string, exactly as typed. Parsing
//! reports the first problem found; nothing here talks to the backend.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{InventoryPatch, NewInventoryItem};
use crate::validation::{validate_new_item, validate_patch};
use crate::DEFAULT_SUPPLIER_ID;

/// Parses a whole number typed into `field`.
///
/// ```rust
/// use stockroom_core::forms::parse_whole_number;
///
/// assert_eq!(parse_whole_number("quantity", " 12 "), Ok(12));
/// assert!(parse_whole_number("quantity", "1.5").is_err());
/// ```
pub fn parse_whole_number(field: &str, input: &str) -> ValidationResult<i64> {
    input.trim().parse().map_err(|_| ValidationError::NotANumber {
        field: field.to_string(),
    })
}

/// Parses a decimal amount typed into `field`.
pub fn parse_amount(field: &str, input: &str) -> ValidationResult<Money> {
    Money::parse(input).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be an amount like 5.00".to_string(),
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Sale Form
// =============================================================================

/// A parsed "record sale" submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl SaleRequest {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        SaleRequest {
            product_id,
            quantity,
        }
    }
}

/// The sales form as typed: a product picked from the list and a quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleForm {
    pub product_id: Option<String>,
    pub quantity: Option<String>,
}

impl SaleForm {
    /// Parses the form.
    ///
    /// ## Errors
    /// - either field blank → [`ValidationError::MissingSaleInput`]
    /// - either field not an integer → [`ValidationError::NotANumber`]
    pub fn parse(&self) -> ValidationResult<SaleRequest> {
        let (Some(product_id), Some(quantity)) =
            (non_blank(&self.product_id), non_blank(&self.quantity))
        else {
            return Err(ValidationError::MissingSaleInput);
        };

        Ok(SaleRequest {
            product_id: parse_whole_number("product_id", product_id)?,
            quantity: parse_whole_number("quantity", quantity)?,
        })
    }
}

// =============================================================================
// Inventory Form
// =============================================================================

/// The inventory form as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryForm {
    pub product_name: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub cost: Option<String>,
    pub supplier_id: Option<String>,
}

impl InventoryForm {
    /// Parses the form into an insert payload.
    ///
    /// ## Rules
    /// ```text
    /// product_name, quantity, price, cost ── all required ──► MissingItemFields
    /// supplier_id ─────────────────────────── blank ────────► DEFAULT_SUPPLIER_ID
    /// then validate_new_item() on the result
    /// ```
    pub fn into_new_item(&self) -> ValidationResult<NewInventoryItem> {
        let (Some(name), Some(quantity), Some(price), Some(cost)) = (
            non_blank(&self.product_name),
            non_blank(&self.quantity),
            non_blank(&self.price),
            non_blank(&self.cost),
        ) else {
            return Err(ValidationError::MissingItemFields);
        };

        let supplier_id = match non_blank(&self.supplier_id) {
            Some(raw) => parse_whole_number("supplier_id", raw)?,
            None => DEFAULT_SUPPLIER_ID,
        };

        let item = NewInventoryItem {
            product_name: name.to_string(),
            quantity: parse_whole_number("quantity", quantity)?,
            price: parse_amount("price", price)?,
            cost: parse_amount("cost", cost)?,
            supplier_id,
        };

        validate_new_item(&item)?;
        Ok(item)
    }

    /// Parses the form into a partial update. Blank fields are left out.
    pub fn into_patch(&self) -> ValidationResult<InventoryPatch> {
        let patch = InventoryPatch {
            product_name: non_blank(&self.product_name).map(str::to_string),
            quantity: non_blank(&self.quantity)
                .map(|raw| parse_whole_number("quantity", raw))
                .transpose()?,
            price: non_blank(&self.price)
                .map(|raw| parse_amount("price", raw))
                .transpose()?,
            cost: non_blank(&self.cost)
                .map(|raw| parse_amount("cost", raw))
                .transpose()?,
            supplier_id: non_blank(&self.supplier_id)
                .map(|raw| parse_whole_number("supplier_id", raw))
                .transpose()?,
        };

        validate_patch(&patch)?;
        Ok(patch)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
