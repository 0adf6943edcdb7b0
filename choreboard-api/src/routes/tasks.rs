/// Task endpoints
///
/// All scoped to the caller's current team.
///
/// - `GET /tasks` - list, optionally filtered by `status`, `assignee_id`, `category_id`
/// - `GET /tasks?id=X` - one task
/// - `GET /tasks?id=X&action=history` - its history, newest first
/// - `POST /tasks` - create
/// - `PUT /tasks` - sparse update, body carries the `id`
/// - `DELETE /tasks?id=X` - delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    routes::{message, success, unknown_action, validate, Envelope, Message},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use choreboard_shared::{
    auth::context::RequestContext,
    models::{
        task::{Task, TaskFilter, TaskPriority, TaskStatus},
        task_history::TaskHistoryEntry,
    },
    registry::{self, NewTaskInput, TaskPatch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct TasksQuery {
    pub id: Option<Uuid>,
    pub action: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<CreateTaskRequest> for NewTaskInput {
    fn from(req: CreateTaskRequest) -> Self {
        NewTaskInput {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            category_id: req.category_id,
            priority: req.priority,
            status: req.status,
            due_date: req.due_date,
        }
    }
}

/// Sparse update; fields sent as `null` are cleared, absent fields kept
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub id: Uuid,

    #[serde(flatten)]
    pub patch: TaskPatch,
}

#[derive(Debug, Serialize)]
pub struct TaskPayload {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TasksPayload {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct HistoryPayload {
    pub history: Vec<TaskHistoryEntry>,
}

/// List tasks, fetch one, or fetch its history
///
/// # Endpoint
///
/// ```text
/// GET /tasks?status=pending&assignee_id=<uuid>
/// GET /tasks?id=<uuid>
/// GET /tasks?id=<uuid>&action=history
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "tasks": [ { "id": "...", "title": "Dishes", "priority": "high", ... } ] }
/// ```
///
/// Lists are ordered high → medium → low, newest first within a priority.
///
/// # Errors
///
/// - `400 Bad Request`: no current team
/// - `403 Forbidden`: not a member of the current team
/// - `404 Not Found`: task missing or in another team
pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<TasksQuery>,
) -> ApiResult<Response> {
    match (query.id, query.action.as_deref()) {
        (Some(id), Some("history")) => {
            let history = registry::task_history(&state.db, &ctx, id).await?;
            Ok(success(HistoryPayload { history }).into_response())
        }
        (Some(id), None) => {
            let task = registry::get_task(&state.db, &ctx, id).await?;
            Ok(success(TaskPayload { task }).into_response())
        }
        (None, None) => {
            let filter = TaskFilter {
                status: query.status,
                assignee_id: query.assignee_id,
                category_id: query.category_id,
            };
            let tasks = registry::list_tasks(&state.db, &ctx, &filter).await?;
            Ok(success(TasksPayload { tasks }).into_response())
        }
        (None, Some("history")) => Err(ApiError::BadRequest("Missing id".to_string())),
        (_, other) => Err(unknown_action(other)),
    }
}

/// Create a task in the current team
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Content-Type: application/json
///
/// {
///   "title": "Take out bins",
///   "priority": "high",
///   "assignee_id": "<uuid>",
///   "due_date": "2024-10-03T18:00:00Z"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "success": true, "task": {...} }`.
///
/// # Errors
///
/// - `400 Bad Request`: invalid title, or assignee/category outside the team
/// - `403 Forbidden`: not a member of the current team
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TaskPayload>>)> {
    validate(&req)?;

    let task = registry::create_task(&state.db, &ctx, req.into()).await?;

    Ok((StatusCode::CREATED, success(TaskPayload { task })))
}

/// Apply a sparse update
///
/// # Endpoint
///
/// ```text
/// PUT /tasks
/// Content-Type: application/json
///
/// { "id": "<uuid>", "status": "completed", "assignee_id": null }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: invalid field values
/// - `404 Not Found`: task missing or in another team
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Envelope<TaskPayload>>> {
    let task = registry::update_task(&state.db, &ctx, req.id, req.patch).await?;

    Ok(success(TaskPayload { task }))
}

/// Delete a task
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks?id=<uuid>
/// ```
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<TasksQuery>,
) -> ApiResult<Json<Envelope<Message>>> {
    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing id".to_string()))?;

    registry::delete_task(&state.db, &ctx, id).await?;

    Ok(message("Task deleted"))
}
