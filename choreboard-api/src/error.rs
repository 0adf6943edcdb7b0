/// Error handling for the API server
///
/// Every handler returns [`ApiResult`]. Errors render as the failure envelope
/// `{"success": false, "message": "..."}` with the matching status code.
/// Domain errors convert via `From<ServiceError>`, so handlers can use `?` on
/// shared-library calls directly.
///
/// # Example
///
/// ```no_run
/// use choreboard_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok(Json(json!({ "success": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use choreboard_shared::{auth::password::PasswordError, error::ServiceError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate username
    Conflict(String),

    /// Request body failed validation (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    pub message: String,
}

/// Failure envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Converts `validator` output into a 400 carrying every field message
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                })
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, details) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
            ApiError::ValidationError(errors) => {
                // lead with the first field message so simple clients can show it as-is
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                (message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Domain errors map one-to-one onto statuses
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Authentication(msg) => ApiError::Unauthorized(msg),
            ServiceError::Authorization(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Dependency(err) => err.into(),
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::ServiceUnavailable("Database unavailable".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("Resource already exists".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Malformed bodies and query strings are client errors, whatever axum's
/// default status for them would be
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}
