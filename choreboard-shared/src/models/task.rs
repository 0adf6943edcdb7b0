/// Task model and database operations
///
/// Tasks are the household chores tracked by a team. Every task belongs to
/// exactly one team; lookups used by request handlers always carry the team ID
/// so one team can never read another team's rows.
///
/// # Status
///
/// ```text
/// pending ⇄ in_progress ⇄ completed
///        ↘      ↓       ↙
///          cancelled
/// ```
///
/// Any status may move to any other. `completed_at` is stamped when a task
/// enters `completed` and is kept if the task is reopened.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BLOB PRIMARY KEY NOT NULL,
///     title TEXT NOT NULL,
///     description TEXT,
///     creator_id BLOB NOT NULL REFERENCES users(id),
///     assignee_id BLOB REFERENCES users(id) ON DELETE SET NULL,
///     team_id BLOB NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     category_id BLOB REFERENCES categories(id) ON DELETE SET NULL,
///     priority TEXT NOT NULL DEFAULT 'medium',
///     status TEXT NOT NULL DEFAULT 'pending',
///     due_date TEXT,
///     completed_at TEXT,
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::models::task::{NewTask, Task, TaskFilter, TaskPriority};
/// use sqlx::SqlitePool;
/// use uuid::Uuid;
///
/// # async fn example(pool: SqlitePool, team_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, NewTask {
///     title: "Take out the bins".to_string(),
///     description: None,
///     creator_id: user_id,
///     assignee_id: Some(user_id),
///     team_id,
///     category_id: None,
///     priority: TaskPriority::High,
///     status: Default::default(),
///     due_date: None,
/// }).await?;
///
/// let tasks = Task::list_by_team(&pool, team_id, &TaskFilter::default()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use std::cmp::Ordering;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, creator_id, assignee_id, team_id, category_id, \
     priority, status, due_date, completed_at, created_at, updated_at";

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the wire form used in query strings
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Completed or cancelled: no more reminders are due
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Listing rank, most urgent first
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Short summary, 1-200 characters
    pub title: String,

    pub description: Option<String>,

    /// User who created the task
    pub creator_id: Uuid,

    /// User responsible for the task
    pub assignee_id: Option<Uuid>,

    pub team_id: Uuid,
    pub category_id: Option<Uuid>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,

    /// Set on the most recent transition into `completed`
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub team_id: Uuid,
    pub category_id: Option<Uuid>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

/// Optional listing filters; `None` matches everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// Orders tasks for display: priority rank, newest first, then ID
pub fn listing_order(a: &Task, b: &Task) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then(b.created_at.cmp(&a.created_at))
        .then(a.id.cmp(&b.id))
}

impl Task {
    /// Inserts a task
    ///
    /// A task created directly in `completed` gets `completed_at` stamped.
    pub async fn create<'e, E>(db: E, data: NewTask) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let now = Utc::now();
        let completed_at = (data.status == TaskStatus::Completed).then_some(now);

        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, title, description, creator_id, assignee_id, team_id,
                                category_id, priority, status, due_date, completed_at,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.title)
        .bind(data.description)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .bind(data.team_id)
        .bind(data.category_id)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.due_date)
        .bind(completed_at)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Finds a task by ID with team isolation
    ///
    /// This is the lookup request handlers use: a task in another team is
    /// indistinguishable from a missing one.
    pub async fn find_in_team<'e, E>(
        db: E,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND team_id = ?"
        ))
        .bind(id)
        .bind(team_id)
        .fetch_optional(db)
        .await
    }

    /// Lists a team's tasks matching `filter`, in listing order
    pub async fn list_by_team<'e, E>(
        db: E,
        team_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let mut tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE team_id = ?
               AND (? IS NULL OR status = ?)
               AND (? IS NULL OR assignee_id = ?)
               AND (? IS NULL OR category_id = ?)"
        ))
        .bind(team_id)
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.assignee_id)
        .bind(filter.assignee_id)
        .bind(filter.category_id)
        .bind(filter.category_id)
        .fetch_all(db)
        .await?;

        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    /// Writes every mutable field of `task` back to its row
    ///
    /// `updated_at` is set to now; `id`, `team_id`, `creator_id` and
    /// `created_at` are never changed.
    pub async fn save<'e, E>(db: E, task: &Task) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = ?, description = ?, assignee_id = ?, category_id = ?,
                 priority = ?, status = ?, due_date = ?, completed_at = ?, updated_at = ?
             WHERE id = ?
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.category_id)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(Utc::now())
        .bind(task.id)
        .fetch_optional(db)
        .await
    }

    /// Open, assigned tasks with a due date, across all teams
    ///
    /// Window filtering happens in the caller; timestamps are stored as text
    /// and compared as `DateTime` values rather than strings.
    pub async fn list_open_assigned_with_due_date<'e, E>(db: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE assignee_id IS NOT NULL
               AND due_date IS NOT NULL
               AND status NOT IN ('completed', 'cancelled')"
        ))
        .fetch_all(db)
        .await
    }

    /// Deletes a task
    ///
    /// History rows are kept; notifications pointing at the task have their
    /// `task_id` nulled by the foreign key.
    pub async fn delete<'e, E>(db: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(priority: TaskPriority, created_at: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Dishes".to_string(),
            description: None,
            creator_id: Uuid::new_v4(),
            assignee_id: None,
            team_id: Uuid::new_v4(),
            category_id: None,
            priority,
            status: TaskStatus::Pending,
            due_date: None,
            completed_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("done"), None);
        assert_eq!(TaskStatus::parse("Completed"), None);
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_listing_order() {
        let base = Utc::now();
        let a = task(TaskPriority::High, base);
        let b = task(TaskPriority::High, base + Duration::seconds(1));
        let c = task(TaskPriority::Medium, base + Duration::seconds(2));
        let d = task(TaskPriority::Low, base + Duration::seconds(3));

        let mut tasks = vec![d.clone(), c.clone(), a.clone(), b.clone()];
        tasks.sort_by(listing_order);

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id, d.id]);
    }
}
