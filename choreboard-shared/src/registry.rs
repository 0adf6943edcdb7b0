/// Task Registry
///
/// Task and category operations, always scoped to the caller's current team.
/// Every operation resolves membership (or the admin role, for category
/// writes) before reading or writing anything.
///
/// Task mutations run in one transaction together with their history entries
/// and notifications. History and notification writes are best-effort: they
/// are logged when they fail and the mutation still commits.
///
/// # Sparse updates
///
/// [`TaskPatch`] distinguishes "absent" from "null" for nullable fields:
///
/// ```json
/// { "title": "Hoover", "assignee_id": null }
/// ```
///
/// renames the task and unassigns it; `description`, `category_id` and
/// `due_date` are left alone because they're absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::auth::authorization::{require_admin, require_member};
use crate::auth::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::fanout;
use crate::ledger;
use crate::models::category::{is_hex_color, Category, CategoryWithCount, DEFAULT_COLOR};
use crate::models::membership::TeamMember;
use crate::models::task::{NewTask, Task, TaskFilter, TaskPriority, TaskStatus};
use crate::models::task_history::{HistoryAction, TaskHistory, TaskHistoryEntry};

/// Maximum title length in characters (after trimming)
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum category name length in characters
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

const TASK_NOT_FOUND: &str = "Task not found";
const CATEGORY_NOT_FOUND: &str = "Category not found";
const CATEGORY_TAKEN: &str = "A category with this name already exists";

/// Maps a present JSON field to `Some`, so `null` becomes `Some(None)`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub category_id: Option<Uuid>,

    /// Defaults to medium
    pub priority: Option<TaskPriority>,

    /// Defaults to pending
    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Sparse task update
///
/// Outer `None`: leave the field alone. `Some(None)`: clear it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<Uuid>>,

    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: String,

    /// `#RRGGBB`, defaults to `#4A90E2`
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Trims a title and checks its length
pub fn validate_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ServiceError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ServiceError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    Ok(title.to_string())
}

/// Empty descriptions are stored as null
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn validate_category_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ServiceError::validation("Category name is required"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(ServiceError::validation(format!(
            "Category name must be at most {} characters",
            MAX_CATEGORY_NAME_LENGTH
        )));
    }

    Ok(name.to_string())
}

fn validate_color(color: &str) -> ServiceResult<String> {
    if !is_hex_color(color) {
        return Err(ServiceError::validation("Color must be a hex value like #4A90E2"));
    }
    Ok(color.to_string())
}

async fn check_assignee(
    conn: &mut SqliteConnection,
    team_id: Uuid,
    assignee_id: Option<Uuid>,
) -> ServiceResult<()> {
    if let Some(assignee_id) = assignee_id {
        if TeamMember::get_role(conn, team_id, assignee_id).await?.is_none() {
            return Err(ServiceError::validation("Assignee is not a member of this team"));
        }
    }
    Ok(())
}

async fn check_category(
    conn: &mut SqliteConnection,
    team_id: Uuid,
    category_id: Option<Uuid>,
) -> ServiceResult<()> {
    if let Some(category_id) = category_id {
        if Category::find_in_team(conn, category_id, team_id).await?.is_none() {
            return Err(ServiceError::validation("Category does not belong to this team"));
        }
    }
    Ok(())
}

/// Tasks of the current team, most urgent first
pub async fn list_tasks(
    pool: &SqlitePool,
    ctx: &RequestContext,
    filter: &TaskFilter,
) -> ServiceResult<Vec<Task>> {
    let team_id = ctx.team_id()?;
    require_member(pool, team_id, ctx.user_id).await?;

    Ok(Task::list_by_team(pool, team_id, filter).await?)
}

pub async fn get_task(pool: &SqlitePool, ctx: &RequestContext, id: Uuid) -> ServiceResult<Task> {
    let team_id = ctx.team_id()?;
    require_member(pool, team_id, ctx.user_id).await?;

    Task::find_in_team(pool, id, team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))
}

/// Creates a task in the current team
///
/// Records a `created` history entry and notifies the assignee unless they
/// are the creator.
pub async fn create_task(
    pool: &SqlitePool,
    ctx: &RequestContext,
    input: NewTaskInput,
) -> ServiceResult<Task> {
    let team_id = ctx.team_id()?;
    let title = validate_title(&input.title)?;

    let mut tx = pool.begin().await?;

    require_member(&mut *tx, team_id, ctx.user_id).await?;
    check_assignee(&mut tx, team_id, input.assignee_id).await?;
    check_category(&mut tx, team_id, input.category_id).await?;

    let task = Task::create(
        &mut *tx,
        NewTask {
            title,
            description: clean_description(input.description),
            creator_id: ctx.user_id,
            assignee_id: input.assignee_id,
            team_id,
            category_id: input.category_id,
            priority: input.priority.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            due_date: input.due_date,
        },
    )
    .await?;

    let _ = ledger::record(&mut tx, task.id, ctx.user_id, HistoryAction::Created, None).await;
    let _ = fanout::on_assignment(&mut tx, ctx.user_id, &task).await;

    tx.commit().await?;

    tracing::info!(task_id = %task.id, team_id = %team_id, user_id = %ctx.user_id, "Task created");
    Ok(task)
}

/// Applies a sparse patch to a task
///
/// `completed_at` is stamped when the status moves into `completed` from
/// anything else and is left untouched by every other transition. A patch
/// that changes nothing writes nothing.
pub async fn update_task(
    pool: &SqlitePool,
    ctx: &RequestContext,
    id: Uuid,
    patch: TaskPatch,
) -> ServiceResult<Task> {
    let team_id = ctx.team_id()?;
    let title = patch.title.as_deref().map(validate_title).transpose()?;

    let mut tx = pool.begin().await?;

    require_member(&mut *tx, team_id, ctx.user_id).await?;

    let old = Task::find_in_team(&mut *tx, id, team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;

    let mut next = old.clone();
    if let Some(title) = title {
        next.title = title;
    }
    if let Some(description) = patch.description {
        next.description = clean_description(description);
    }
    if let Some(assignee_id) = patch.assignee_id {
        check_assignee(&mut tx, team_id, assignee_id).await?;
        next.assignee_id = assignee_id;
    }
    if let Some(category_id) = patch.category_id {
        check_category(&mut tx, team_id, category_id).await?;
        next.category_id = category_id;
    }
    if let Some(priority) = patch.priority {
        next.priority = priority;
    }
    if let Some(status) = patch.status {
        next.status = status;
    }
    if let Some(due_date) = patch.due_date {
        next.due_date = due_date;
    }

    if next.status == TaskStatus::Completed && old.status != TaskStatus::Completed {
        next.completed_at = Some(Utc::now());
    }

    if ledger::diff_tasks(&old, &next).is_empty() {
        return Ok(old);
    }

    let saved = Task::save(&mut *tx, &next)
        .await?
        .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;

    let _ = ledger::record_update(&mut tx, ctx.user_id, &old, &next).await;

    if saved.assignee_id != old.assignee_id {
        let _ = fanout::on_assignment(&mut tx, ctx.user_id, &saved).await;
    }
    if saved.status != old.status {
        let _ = fanout::on_status_change(&mut tx, ctx.user_id, &saved, old.status, saved.status).await;
    }

    tx.commit().await?;

    tracing::info!(task_id = %saved.id, user_id = %ctx.user_id, "Task updated");
    Ok(saved)
}

/// Hard-deletes a task
///
/// The pre-delete snapshot goes into the `deleted` history entry and the
/// deletion notifications, since the row is gone afterwards.
pub async fn delete_task(pool: &SqlitePool, ctx: &RequestContext, id: Uuid) -> ServiceResult<()> {
    let team_id = ctx.team_id()?;

    let mut tx = pool.begin().await?;

    require_member(&mut *tx, team_id, ctx.user_id).await?;

    let snapshot = Task::find_in_team(&mut *tx, id, team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;

    Task::delete(&mut *tx, id).await?;

    let _ = ledger::record(
        &mut tx,
        id,
        ctx.user_id,
        HistoryAction::Deleted,
        Some(ledger::snapshot(&snapshot)),
    )
    .await;
    let _ = fanout::on_deletion(&mut tx, ctx.user_id, &snapshot).await;

    tx.commit().await?;

    tracing::info!(task_id = %id, team_id = %team_id, user_id = %ctx.user_id, "Task deleted");
    Ok(())
}

/// History of a task in the current team, newest first
pub async fn task_history(
    pool: &SqlitePool,
    ctx: &RequestContext,
    id: Uuid,
) -> ServiceResult<Vec<TaskHistoryEntry>> {
    let task = get_task(pool, ctx, id).await?;
    Ok(TaskHistory::list_for_task(pool, task.id).await?)
}

/// Categories of the current team with task counts
pub async fn list_categories(
    pool: &SqlitePool,
    ctx: &RequestContext,
) -> ServiceResult<Vec<CategoryWithCount>> {
    let team_id = ctx.team_id()?;
    require_member(pool, team_id, ctx.user_id).await?;

    Ok(Category::list_by_team(pool, team_id).await?)
}

/// Creates a category (admin only)
pub async fn create_category(
    pool: &SqlitePool,
    ctx: &RequestContext,
    input: CategoryInput,
) -> ServiceResult<Category> {
    let team_id = ctx.team_id()?;
    let name = validate_category_name(&input.name)?;
    let color = validate_color(input.color.as_deref().unwrap_or(DEFAULT_COLOR))?;

    require_admin(pool, team_id, ctx.user_id).await?;

    let category = Category::create(pool, team_id, &name, &color, ctx.user_id)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, CATEGORY_TAKEN))?;

    tracing::info!(category_id = %category.id, team_id = %team_id, "Category created");
    Ok(category)
}

/// Renames or recolors a category (admin only)
pub async fn update_category(
    pool: &SqlitePool,
    ctx: &RequestContext,
    id: Uuid,
    patch: CategoryPatch,
) -> ServiceResult<Category> {
    let team_id = ctx.team_id()?;
    let name = patch.name.as_deref().map(validate_category_name).transpose()?;
    let color = patch.color.as_deref().map(validate_color).transpose()?;

    require_admin(pool, team_id, ctx.user_id).await?;

    let existing = Category::find_in_team(pool, id, team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(CATEGORY_NOT_FOUND))?;

    let name = name.unwrap_or(existing.name);
    let color = color.unwrap_or(existing.color);

    Category::update(pool, id, &name, &color)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, CATEGORY_TAKEN))?
        .ok_or_else(|| ServiceError::not_found(CATEGORY_NOT_FOUND))
}

/// Deletes a category (admin only)
///
/// Tasks tagged with it are kept and lose the tag, in the same transaction.
pub async fn delete_category(pool: &SqlitePool, ctx: &RequestContext, id: Uuid) -> ServiceResult<()> {
    let team_id = ctx.team_id()?;

    let mut tx = pool.begin().await?;

    require_admin(&mut *tx, team_id, ctx.user_id).await?;

    if Category::find_in_team(&mut *tx, id, team_id).await?.is_none() {
        return Err(ServiceError::not_found(CATEGORY_NOT_FOUND));
    }

    let detached = Category::detach_tasks(&mut *tx, id).await?;
    Category::delete(&mut *tx, id).await?;

    tx.commit().await?;

    tracing::info!(category_id = %id, team_id = %team_id, detached, "Category deleted");
    Ok(())
}
