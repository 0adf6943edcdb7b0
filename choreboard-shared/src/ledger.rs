/// History Ledger
///
/// Append-only audit trail of task mutations. Entries are written on the same
/// connection (usually an open transaction) as the mutation they describe, but
/// a failed entry never fails the mutation: every write returns
/// [`BestEffort`].
///
/// # Change sets
///
/// | Action | `changes` |
/// |---|---|
/// | `created` | null |
/// | `updated` | `{ "<field>": { "old": .., "new": .. } }` over the tracked fields |
/// | `status_changed` | `{ "field": "status", "old_value": .., "new_value": .. }` |
/// | `deleted` | full task snapshot |

use serde_json::{json, Map, Value as JsonValue};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::best_effort::BestEffort;
use crate::models::task::{Task, TaskStatus};
use crate::models::task_history::{HistoryAction, TaskHistory};

/// Fields compared by [`diff_tasks`]
pub const TRACKED_FIELDS: [&str; 7] = [
    "title",
    "description",
    "status",
    "priority",
    "due_date",
    "assignee_id",
    "category_id",
];

fn tracked_values(task: &Task) -> [(&'static str, JsonValue); 7] {
    [
        ("title", json!(task.title)),
        ("description", json!(task.description)),
        ("status", json!(task.status)),
        ("priority", json!(task.priority)),
        ("due_date", json!(task.due_date)),
        ("assignee_id", json!(task.assignee_id)),
        ("category_id", json!(task.category_id)),
    ]
}

/// Appends one entry
pub async fn record(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    user_id: Uuid,
    action: HistoryAction,
    changes: Option<JsonValue>,
) -> BestEffort<TaskHistory> {
    let result = TaskHistory::insert(conn, task_id, user_id, action, changes).await;

    if result.is_ok() {
        tracing::debug!(task_id = %task_id, user_id = %user_id, action = action.as_str(), "History recorded");
    }

    BestEffort::from_result(result, "Task history write")
}

/// Tracked fields that differ between two versions of a task
///
/// Returns an empty map when nothing tracked changed.
pub fn diff_tasks(old: &Task, new: &Task) -> Map<String, JsonValue> {
    tracked_values(old)
        .into_iter()
        .zip(tracked_values(new))
        .filter(|((_, before), (_, after))| before != after)
        .map(|((field, before), (_, after))| {
            (field.to_string(), json!({ "old": before, "new": after }))
        })
        .collect()
}

pub fn status_change(old: TaskStatus, new: TaskStatus) -> JsonValue {
    json!({
        "field": "status",
        "old_value": old,
        "new_value": new,
    })
}

/// Full task JSON, kept with the `deleted` entry
pub fn snapshot(task: &Task) -> JsonValue {
    serde_json::to_value(task).unwrap_or(JsonValue::Null)
}

/// Records the entries for an update
///
/// One `updated` entry (carrying the full diff) if anything besides status
/// changed, plus one `status_changed` entry if the status changed. Nothing is
/// written for a no-op update.
pub async fn record_update(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    old: &Task,
    new: &Task,
) -> Vec<BestEffort<TaskHistory>> {
    let diff = diff_tasks(old, new);
    let mut outcomes = Vec::new();

    if diff.keys().any(|field| field != "status") {
        outcomes.push(
            record(
                &mut *conn,
                new.id,
                user_id,
                HistoryAction::Updated,
                Some(JsonValue::Object(diff)),
            )
            .await,
        );
    }

    if old.status != new.status {
        outcomes.push(
            record(
                &mut *conn,
                new.id,
                user_id,
                HistoryAction::StatusChanged,
                Some(status_change(old.status, new.status)),
            )
            .await,
        );
    }

    outcomes
}
