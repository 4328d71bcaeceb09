//! # Error Types
//!
//! Validation errors raised before any backend request is made.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core (this file)                                            │
//! │  └── ValidationError  - Precondition failed locally                    │
//! │                                                                         │
//! │  stockroom-store                                                       │
//! │  ├── StoreError       - Backend-reported failures (classified)         │
//! │  └── AuthError        - Auth provider failures                         │
//! │                                                                         │
//! │  apps/cli                                                              │
//! │  └── ApiError         - What the user sees (code + message)            │
//! │                                                                         │
//! │  Flow: ValidationError ─────────────┐                                  │
//! │        StoreError / AuthError ──────┴──► ApiError ──► User             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `ValidationError` never reaches the backend: every producer of this type
//! runs before the first request.

use thiserror::Error;

/// Input validation errors.
///
/// The messages of the sale and item variants are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Sale form submitted without a product or a quantity.
    #[error("Please select a product and enter a quantity.")]
    MissingSaleInput,

    /// The product is not in the client's current inventory view.
    #[error("Selected product not found in inventory.")]
    ProductNotInView { product_id: i64 },

    /// Requested quantity is larger than the stock shown in the view.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 11)
    ///      │
    ///      ▼
    /// View says: Widget available=10
    ///      │
    ///      ▼
    /// ExceedsStock { requested: 11, available: 10 }
    ///      │
    ///      ▼
    /// No request is sent, inventory stays at 10
    /// ```
    #[error("Quantity exceeds available inventory.")]
    ExceedsStock { requested: i64, available: i64 },

    /// Inventory form submitted with one of its required fields empty.
    #[error("Product name, quantity, price, and cost are required.")]
    MissingItemFields,

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Field expected an integer.
    #[error("{field} must be a whole number")]
    NotANumber { field: String },

    /// Invalid format (e.g. a malformed amount or email address).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An update carried no fields.
    #[error("Nothing to update")]
    EmptyUpdate,
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
