//! # API Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Command Function  →  Result<T, ApiError>                              │
//! │         │                                                               │
//! │         ├── ValidationError (core) ─────────────► VALIDATION           │
//! │         │     never reaches the backend                                 │
//! │         │                                                               │
//! │         ├── StoreError (store)                                          │
//! │         │     ├── permission ───────────────────► PERMISSION           │
//! │         │     ├── token refused (HTTP 401) ─────► UNAUTHENTICATED      │
//! │         │     ├── unique / FK / check ──────────► CONSTRAINT           │
//! │         │     ├── not found ────────────────────► NOT_FOUND            │
//! │         │     └── backend / transport / decode ─► TRANSPORT            │
//! │         │                                                               │
//! │         ├── SaleError::PartialFailure ──────────► PARTIAL_FAILURE      │
//! │         │     sale row kept, stock not updated                          │
//! │         │                                                               │
//! │         └── AuthError / route guard ────────────► UNAUTHENTICATED ...  │
//! │                                                                         │
//! │  main.rs prints `[CODE] message` and exits non-zero                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is logged where it is classified, so the printed message
//! can stay short.

use serde::Serialize;
use stockroom_core::{Sale, ValidationError};
use stockroom_store::{AuthError, ConfigError, StoreError};
use thiserror::Error;

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CONSTRAINT",
///   "message": "An item with this name already exists. Please use a unique name."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed a local check; nothing was sent
    Validation,

    /// The backend refused the operation
    Permission,

    /// Uniqueness, reference or check constraint violated
    Constraint,

    /// Sale recorded, inventory not updated
    PartialFailure,

    /// Backend unreachable or answered with an unclassified error
    Transport,

    /// Row no longer exists (stale view)
    NotFound,

    /// Route needs a signed-in user
    Unauthenticated,

    /// Configuration could not be loaded or is invalid
    Config,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Permission => "PERMISSION",
            ErrorCode::Constraint => "CONSTRAINT",
            ErrorCode::PartialFailure => "PARTIAL_FAILURE",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shown for any permission denial, whatever the backend said.
pub const PERMISSION_MESSAGE: &str = "Permission denied. Please check your database permissions.";

/// Shown when the backend refuses the bearer token.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session is missing or has expired. Please log in again.";

/// Shown for a duplicate product name.
pub const DUPLICATE_NAME_MESSAGE: &str =
    "An item with this name already exists. Please use a unique name.";

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Validation, message)
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: i64) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates an unauthenticated error for a protected path.
    pub fn unauthenticated(path: &str) -> Self {
        ApiError::new(
            ErrorCode::Unauthenticated,
            format!("Sign in to open {}", path),
        )
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        tracing::debug!(error = %err, "Validation failed");
        ApiError::validation(err.to_string())
    }
}

/// Converts store errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied { message } => {
                tracing::warn!(%message, "Backend denied operation");
                ApiError::new(ErrorCode::Permission, PERMISSION_MESSAGE)
            }
            StoreError::Unauthenticated { message } => {
                tracing::warn!(%message, "Backend refused the access token");
                ApiError::new(ErrorCode::Unauthenticated, SESSION_EXPIRED_MESSAGE)
            }
            StoreError::UniqueViolation { message } => {
                tracing::warn!(%message, "Unique constraint violated");
                ApiError::new(ErrorCode::Constraint, DUPLICATE_NAME_MESSAGE)
            }
            StoreError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "Foreign key violated");
                ApiError::new(
                    ErrorCode::Constraint,
                    "The selected product no longer exists.",
                )
            }
            StoreError::CheckViolation { message } => {
                tracing::warn!(%message, "Check constraint violated");
                ApiError::new(
                    ErrorCode::Constraint,
                    format!("Rejected by the database: {}", message),
                )
            }
            StoreError::NotFound { collection, id } => {
                tracing::warn!(%collection, id, "Row not found");
                ApiError::new(
                    ErrorCode::NotFound,
                    format!("{} row {} no longer exists. Refresh and try again.", collection, id),
                )
            }
            other => {
                tracing::error!(error = %other, "Backend request failed");
                ApiError::new(ErrorCode::Transport, other.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(e) => ApiError::from(e),
            AuthError::Rejected { status, message } => {
                tracing::warn!(status, %message, "Auth provider rejected request");
                ApiError::new(ErrorCode::Permission, message)
            }
            AuthError::NotSignedIn => ApiError::new(ErrorCode::Unauthenticated, "Not signed in"),
            other => {
                tracing::error!(error = %other, "Auth request failed");
                ApiError::new(ErrorCode::Transport, other.to_string())
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::new(ErrorCode::Config, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Sale Error
// =============================================================================

/// Outcome of a failed sale.
///
/// `PartialFailure` is the one variant where something was written: the
/// sale row exists and the stock level was not changed.
#[derive(Debug, Clone, Error)]
pub enum SaleError {
    /// Precondition failed against the inventory view; no request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The inventory fetch, the sale insert or the atomic procedure failed;
    /// nothing was written.
    #[error(transparent)]
    Rejected(#[from] StoreError),

    /// The sale row exists but the decrement failed.
    #[error("Sale added but failed to update inventory: {cause}")]
    PartialFailure { sale: Sale, cause: StoreError },
}

impl SaleError {
    /// The persisted sale, if the failure left one behind.
    pub fn recorded_sale(&self) -> Option<&Sale> {
        match self {
            SaleError::PartialFailure { sale, .. } => Some(sale),
            _ => None,
        }
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Validation(e) => ApiError::from(e),
            SaleError::Rejected(e) => ApiError::from(e),
            partial @ SaleError::PartialFailure { .. } => {
                let message = partial.to_string();
                if let SaleError::PartialFailure { sale, cause } = &partial {
                    tracing::error!(
                        sale_id = sale.id,
                        product_id = sale.product_id,
                        quantity = sale.quantity,
                        error = %cause,
                        "Sale recorded but inventory not updated"
                    );
                }
                ApiError::new(ErrorCode::PartialFailure, message)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::Money;

    #[test]
    fn test_store_error_mapping() {
        let err = ApiError::from(StoreError::PermissionDenied {
            message: "new row violates row-level security policy".into(),
        });
        assert_eq!(err.code, ErrorCode::Permission);
        assert_eq!(err.message, PERMISSION_MESSAGE);

        let err = ApiError::from(StoreError::UniqueViolation {
            message: "duplicate key".into(),
        });
        assert_eq!(err.code, ErrorCode::Constraint);
        assert_eq!(err.message, DUPLICATE_NAME_MESSAGE);

        let err = ApiError::from(StoreError::from_response_text(
            401,
            r#"{"code":"PGRST301","message":"JWT expired"}"#,
        ));
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.message, SESSION_EXPIRED_MESSAGE);

        let err = ApiError::from(StoreError::not_found("inventory", 3));
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = ApiError::from(StoreError::Transport("connection refused".into()));
        assert_eq!(err.code, ErrorCode::Transport);
    }

    #[test]
    fn test_partial_failure_message() {
        let sale = Sale {
            id: 4,
            product_id: 1,
            quantity: 3,
            price: Money::from_cents(500),
            sale_date: Utc::now(),
            created_at: None,
        };
        let err = SaleError::PartialFailure {
            sale: sale.clone(),
            cause: StoreError::PermissionDenied {
                message: "denied".into(),
            },
        };
        assert_eq!(err.recorded_sale(), Some(&sale));

        let api = ApiError::from(err);
        assert_eq!(api.code, ErrorCode::PartialFailure);
        assert_eq!(
            api.message,
            "Sale added but failed to update inventory: Permission denied: denied"
        );
    }

    #[test]
    fn test_display_and_serialization() {
        let err = ApiError::from(ValidationError::ExceedsStock {
            requested: 11,
            available: 10,
        });
        assert_eq!(
            err.to_string(),
            "[VALIDATION] Quantity exceeds available inventory."
        );

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION");
    }
}
