use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these,
// never on the human-readable message string.

/// Stable error code constants.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const UPSTREAM: &str = "UPSTREAM";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified error type shared by the tracking, inventory and client crates.
///
/// Every variant maps to a stable error code (see [`error_code`]). Errors
/// coming back from the REST backend are folded into this type with
/// [`ServiceError::from_status`], so callers never need to know whether a
/// failure was produced locally or by the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key / resource already exists. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid. HTTP 400 / 422.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacks required permission. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// The backend could not be reached (transport failure).
    #[error("{0}")]
    Unavailable(String),

    /// Any other non-2xx answer from the backend.
    #[error("HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Local storage failure (pending-orders database).
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error, including malformed responses.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::Unavailable(_) => error_code::UNAVAILABLE,
            ServiceError::Upstream { .. } => error_code::UPSTREAM,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// Classify a non-2xx HTTP answer.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => ServiceError::Validation(message),
            401 => ServiceError::Unauthorized(message),
            403 => ServiceError::PermissionDenied(message),
            404 => ServiceError::NotFound(message),
            409 => ServiceError::Conflict(message),
            _ => ServiceError::Upstream { status, message },
        }
    }
}
