/// Domain error taxonomy
///
/// Every operation in the directory, registration, registry and notification
/// modules returns [`ServiceResult`]. The API crate maps each variant onto an
/// HTTP status; the worker just logs them.
///
/// Validation and authorization failures are raised before any statement
/// reaches the store. Store failures arrive as [`ServiceError::Dependency`]
/// unless the call site owns a unique constraint, in which case it converts
/// the violation into [`ServiceError::Conflict`] itself.

use crate::db::is_unique_violation;

/// Result alias for domain operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error type for domain operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// No session, expired session or bad credentials
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but lacking membership or role
    #[error("{0}")]
    Authorization(String),

    /// Entity absent or outside the caller's team
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint clash (username, invite code, category name, membership)
    #[error("{0}")]
    Conflict(String),

    /// Backing store unavailable or query failure
    #[error("Database error: {0}")]
    Dependency(#[from] sqlx::Error),

    /// Anything else that isn't the caller's fault
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Authorization(msg.into())
    }

    /// Converts a unique violation into `Conflict(msg)`, anything else into `Dependency`
    pub fn conflict_on_unique(err: sqlx::Error, msg: impl Into<String>) -> Self {
        if is_unique_violation(&err) {
            ServiceError::Conflict(msg.into())
        } else {
            ServiceError::Dependency(err)
        }
    }
}
