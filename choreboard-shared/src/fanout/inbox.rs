/// Recipient-side notification operations
///
/// Every call is scoped to `ctx.user_id`. Another user's notification is
/// reported as not found, never as forbidden, so IDs can't be probed.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::notification::Notification;

const NOT_FOUND: &str = "Notification not found";

/// The caller's notifications, newest first
pub async fn list_notifications(
    pool: &SqlitePool,
    ctx: &RequestContext,
    unread_only: bool,
) -> ServiceResult<Vec<Notification>> {
    Ok(Notification::list_for_user(pool, ctx.user_id, unread_only).await?)
}

pub async fn unread_count(pool: &SqlitePool, ctx: &RequestContext) -> ServiceResult<i64> {
    Ok(Notification::unread_count(pool, ctx.user_id).await?)
}

pub async fn mark_read(pool: &SqlitePool, ctx: &RequestContext, id: Uuid) -> ServiceResult<()> {
    if !Notification::mark_read(pool, id, ctx.user_id).await? {
        return Err(ServiceError::not_found(NOT_FOUND));
    }
    Ok(())
}

/// Marks everything read, returns how many notifications changed
pub async fn mark_all_read(pool: &SqlitePool, ctx: &RequestContext) -> ServiceResult<u64> {
    let updated = Notification::mark_all_read(pool, ctx.user_id).await?;
    tracing::debug!(user_id = %ctx.user_id, updated, "Notifications marked read");
    Ok(updated)
}

pub async fn delete_notification(
    pool: &SqlitePool,
    ctx: &RequestContext,
    id: Uuid,
) -> ServiceResult<()> {
    if !Notification::delete(pool, id, ctx.user_id).await? {
        return Err(ServiceError::not_found(NOT_FOUND));
    }
    Ok(())
}
