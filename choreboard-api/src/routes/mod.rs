/// API route handlers, one module per resource
///
/// Handlers validate the request shape, hand a [`RequestContext`] to the
/// shared library and wrap the result in the success envelope
/// `{"success": true, ...payload}`.
///
/// [`RequestContext`]: choreboard_shared::auth::context::RequestContext

pub mod auth;
pub mod categories;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod teams;

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// Success envelope; the payload's fields sit next to `success`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(flatten)]
    pub payload: T,
}

pub fn success<T: Serialize>(payload: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        payload,
    })
}

/// Payload for operations with nothing else to return
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn message(message: &'static str) -> Json<Envelope<Message>> {
    success(Message { message })
}

/// `?id=` and `?action=` as used by most resources
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub id: Option<Uuid>,
    pub action: Option<String>,
}

impl ActionQuery {
    pub fn require_id(&self) -> ApiResult<Uuid> {
        self.id
            .ok_or_else(|| ApiError::BadRequest("Missing id".to_string()))
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

pub fn unknown_action(action: Option<&str>) -> ApiError {
    match action {
        Some(action) => ApiError::BadRequest(format!("Unknown action: {}", action)),
        None => ApiError::BadRequest("Missing action".to_string()),
    }
}

/// Runs `validator` on a request body
pub fn validate<T: Validate>(req: &T) -> ApiResult<()> {
    req.validate().map_err(ApiError::from_validation)
}
