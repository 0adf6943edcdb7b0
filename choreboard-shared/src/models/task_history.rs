/// Task history (audit ledger) rows
///
/// Append-only: nothing in the application updates or deletes these rows.
/// `task_id` carries no foreign key so the trail outlives the task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_history (
///     id BLOB PRIMARY KEY NOT NULL,
///     task_id BLOB NOT NULL,
///     user_id BLOB NOT NULL,
///     action TEXT NOT NULL,   -- created | updated | deleted | status_changed
///     changes TEXT,           -- JSON
///     created_at TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::SqliteExecutor;
use uuid::Uuid;

/// What happened to the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Updated => "updated",
            HistoryAction::Deleted => "deleted",
            HistoryAction::StatusChanged => "status_changed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    pub id: Uuid,
    pub task_id: Uuid,

    /// Actor
    pub user_id: Uuid,

    pub action: HistoryAction,
    pub changes: Option<Json<JsonValue>>,
    pub created_at: DateTime<Utc>,
}

/// History entry joined with the actor's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,

    /// Actor's nickname, None if the account is gone
    pub nickname: Option<String>,

    pub action: HistoryAction,
    pub changes: Option<Json<JsonValue>>,
    pub created_at: DateTime<Utc>,
}

impl TaskHistory {
    pub async fn insert<'e, E>(
        db: E,
        task_id: Uuid,
        user_id: Uuid,
        action: HistoryAction,
        changes: Option<JsonValue>,
    ) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, TaskHistory>(
            r#"
            INSERT INTO task_history (id, task_id, user_id, action, changes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, task_id, user_id, action, changes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(user_id)
        .bind(action)
        .bind(changes.map(Json))
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    /// All entries for a task, newest first
    pub async fn list_for_task<'e, E>(
        db: E,
        task_id: Uuid,
    ) -> Result<Vec<TaskHistoryEntry>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let mut entries = sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            SELECT h.id, h.task_id, h.user_id, u.nickname, h.action, h.changes, h.created_at
            FROM task_history h
            LEFT JOIN users u ON u.id = h.user_id
            WHERE h.task_id = ?
            "#,
        )
        .bind(task_id)
        .fetch_all(db)
        .await?;

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_action_as_str() {
        assert_eq!(HistoryAction::Created.as_str(), "created");
        assert_eq!(HistoryAction::Updated.as_str(), "updated");
        assert_eq!(HistoryAction::Deleted.as_str(), "deleted");
        assert_eq!(HistoryAction::StatusChanged.as_str(), "status_changed");
    }
}
