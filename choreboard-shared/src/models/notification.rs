/// Notification model and database operations
///
/// One row per recipient. Every query that reads or changes a notification
/// is scoped by `user_id`, so a user can only ever see their own.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id BLOB PRIMARY KEY NOT NULL,
///     user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_by BLOB REFERENCES users(id) ON DELETE SET NULL,
///     task_id BLOB REFERENCES tasks(id) ON DELETE SET NULL,
///     type TEXT NOT NULL,
///     content TEXT NOT NULL,
///     is_read INTEGER NOT NULL DEFAULT 0,
///     created_at TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, created_by, task_id, type, content, is_read, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DueReminder,
    TaskAssigned,
    StatusChanged,
    TeamInvite,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::DueReminder => "due_reminder",
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::StatusChanged => "status_changed",
            NotificationType::TeamInvite => "team_invite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    /// Actor, None for system-generated reminders
    pub created_by: Option<Uuid>,

    pub task_id: Option<Uuid>,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub created_by: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub kind: NotificationType,
    pub content: String,
}

impl Notification {
    pub async fn insert<'e, E>(db: E, data: NewNotification) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications (id, user_id, created_by, task_id, type, content, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.created_by)
        .bind(data.task_id)
        .bind(data.kind)
        .bind(data.content)
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    /// A recipient's notifications, newest first
    pub async fn list_for_user<'e, E>(
        db: E,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let mut notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ? AND (? = 0 OR is_read = 0)"
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(db)
        .await?;

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    pub async fn unread_count<'e, E>(db: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .fetch_one(db)
            .await
    }

    /// Marks one notification read; false if the recipient has no such notification
    pub async fn mark_read<'e, E>(db: E, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks every unread notification of a recipient read, returns how many changed
    pub async fn mark_all_read<'e, E>(db: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(db)
                .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(db: E, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts notifications of one type for a recipient
    pub async fn count_by_type<'e, E>(
        db: E,
        user_id: Uuid,
        kind: NotificationType,
    ) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND type = ?")
            .bind(user_id)
            .bind(kind)
            .fetch_one(db)
            .await
    }
}
