//! # Store Error Types
//!
//! Backend failures, classified by the machine-readable code the backend
//! returns rather than by message text.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Classification                                 │
//! │                                                                         │
//! │  HTTP response {code, message, details, hint}                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError::from_backend(status, body)                                │
//! │       │                                                                 │
//! │       ├── HTTP 401 (any code) ──────────► Unauthenticated              │
//! │       ├── 42501, HTTP 403 ────────────────► PermissionDenied             │
//! │       ├── 23505 ────────────────────────► UniqueViolation              │
//! │       ├── 23503 ────────────────────────► ForeignKeyViolation          │
//! │       ├── 23514, 23502 ─────────────────► CheckViolation               │
//! │       ├── PGRST116 ─────────────────────► NotFound                     │
//! │       └── anything else ────────────────► Backend                      │
//! │                                                                         │
//! │  reqwest error (DNS, TLS, timeout) ─────► Transport                    │
//! │  Row doesn't decode ────────────────────► Decode                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use stockroom_core::ValidationError;
use thiserror::Error;

/// Postgres code: insufficient privilege (row-level security denial).
pub const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";
/// Postgres code: unique constraint.
pub const PG_UNIQUE_VIOLATION: &str = "23505";
/// Postgres code: foreign key constraint.
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres code: check constraint.
pub const PG_CHECK_VIOLATION: &str = "23514";
/// Postgres code: not-null constraint.
pub const PG_NOT_NULL_VIOLATION: &str = "23502";
/// Gateway code: singular response requested, zero rows matched.
pub const REST_NO_ROWS: &str = "PGRST116";
/// Gateway code: procedure not found.
pub const REST_UNKNOWN_PROCEDURE: &str = "PGRST202";

/// Structured error body returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

// =============================================================================
// Store Error
// =============================================================================

/// Record store operation errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend refused the operation under the current authorization.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// The bearer token is missing, invalid or expired (HTTP 401).
    #[error("Not authenticated: {message}")]
    Unauthenticated { message: String },

    /// Unique constraint violation (e.g. duplicate product name).
    #[error("Unique constraint violated: {message}")]
    UniqueViolation { message: String },

    /// Foreign key violation (e.g. sale for a product that no longer exists).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Check or not-null constraint violation (e.g. negative stock).
    #[error("Constraint violated: {message}")]
    CheckViolation { message: String },

    /// No row matched the identifier.
    #[error("{collection} row not found: {id}")]
    NotFound { collection: String, id: i64 },

    /// The backend answered with an error we don't classify.
    #[error("Backend error{}: {message}", code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// The backend could not be reached, or the exchange broke off.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// A row or response body didn't have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Coarse category of a [`StoreError`], matching the user-facing taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Permission,
    Constraint,
    NotFound,
    Transport,
}

impl StoreError {
    /// Creates a NotFound error for a collection and id.
    pub fn not_found(collection: impl Into<String>, id: i64) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id,
        }
    }

    /// Classifies an error response.
    ///
    /// A 401 always means the token was refused (`PGRST301` for an expired
    /// JWT and similar). Otherwise the backend code wins over the HTTP
    /// status, which is only used when the body carries no code.
    pub fn from_backend(status: u16, body: BackendErrorBody) -> Self {
        let message = body
            .message
            .clone()
            .or_else(|| body.details.clone())
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == 401 {
            return StoreError::Unauthenticated { message };
        }

        match body.code.as_deref() {
            Some(PG_INSUFFICIENT_PRIVILEGE) => StoreError::PermissionDenied { message },
            Some(PG_UNIQUE_VIOLATION) => StoreError::UniqueViolation { message },
            Some(PG_FOREIGN_KEY_VIOLATION) => StoreError::ForeignKeyViolation { message },
            Some(PG_CHECK_VIOLATION) | Some(PG_NOT_NULL_VIOLATION) => {
                StoreError::CheckViolation { message }
            }
            Some(REST_NO_ROWS) => StoreError::NotFound {
                collection: "record".to_string(),
                id: 0,
            },
            None if status == 403 => StoreError::PermissionDenied { message },
            code => StoreError::Backend {
                status: Some(status),
                code: code.map(str::to_string),
                message,
            },
        }
    }

    /// Classifies an error response whose body may not be JSON.
    pub fn from_response_text(status: u16, text: &str) -> Self {
        let body = serde_json::from_str::<BackendErrorBody>(text).unwrap_or_else(|_| {
            BackendErrorBody {
                message: (!text.trim().is_empty()).then(|| text.trim().to_string()),
                ..Default::default()
            }
        });
        StoreError::from_backend(status, body)
    }

    /// Returns the taxonomy category.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::PermissionDenied { .. } | StoreError::Unauthenticated { .. } => {
                StoreErrorKind::Permission
            }
            StoreError::UniqueViolation { .. }
            | StoreError::ForeignKeyViolation { .. }
            | StoreError::CheckViolation { .. } => StoreErrorKind::Constraint,
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::Backend { .. } | StoreError::Transport(_) | StoreError::Decode(_) => {
                StoreErrorKind::Transport
            }
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::Transport(format!("invalid URL: {err}"))
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Auth Error
// =============================================================================

/// Auth provider errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Email or password failed local checks.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider rejected the request (bad credentials, taken email, ...).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The operation needs a signed-in session.
    #[error("Not signed in")]
    NotSignedIn,

    /// The provider could not be reached.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The provider answered with an unexpected body.
    #[error("Malformed auth response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::Decode(err.to_string())
        } else {
            AuthError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::Transport(format!("invalid URL: {err}"))
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Config Error
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
