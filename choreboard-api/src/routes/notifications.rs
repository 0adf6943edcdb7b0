/// Notification endpoints, always scoped to the signed-in recipient
///
/// - `GET /notifications[?unread=1]`
/// - `PUT /notifications?id=X` - mark one read
/// - `PUT /notifications?action=read_all` - mark all read
/// - `DELETE /notifications?id=X`
///
/// Another user's notification ID answers 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiQuery,
    routes::{message, success, unknown_action, Envelope, Message},
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use choreboard_shared::{
    auth::context::RequestContext, fanout::inbox, models::notification::Notification,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationsQuery {
    pub id: Option<Uuid>,
    pub action: Option<String>,

    /// `1` or `true` lists unread only
    pub unread: Option<String>,
}

impl NotificationsQuery {
    fn unread_only(&self) -> bool {
        matches!(self.unread.as_deref(), Some("1" | "true"))
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationsPayload {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadAllPayload {
    pub updated: u64,
}

/// # Response
///
/// ```json
/// {
///   "success": true,
///   "notifications": [ { "id": "...", "type": "task_assigned", "content": "...", "is_read": false } ],
///   "unread_count": 1
/// }
/// ```
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<NotificationsQuery>,
) -> ApiResult<Json<Envelope<NotificationsPayload>>> {
    let notifications = inbox::list_notifications(&state.db, &ctx, query.unread_only()).await?;
    let unread_count = inbox::unread_count(&state.db, &ctx).await?;

    Ok(success(NotificationsPayload {
        notifications,
        unread_count,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<NotificationsQuery>,
) -> ApiResult<Response> {
    match (query.action.as_deref(), query.id) {
        (Some("read_all"), _) => {
            let updated = inbox::mark_all_read(&state.db, &ctx).await?;
            Ok(success(ReadAllPayload { updated }).into_response())
        }
        (None, Some(id)) => {
            inbox::mark_read(&state.db, &ctx, id).await?;
            Ok(message("Notification marked read").into_response())
        }
        (None, None) => Err(ApiError::BadRequest("Missing id".to_string())),
        (other, _) => Err(unknown_action(other)),
    }
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<NotificationsQuery>,
) -> ApiResult<Json<Envelope<Message>>> {
    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing id".to_string()))?;

    inbox::delete_notification(&state.db, &ctx, id).await?;
    Ok(message("Notification deleted"))
}
