/// Notification Fan-out
///
/// Turns task and team events into per-user notification rows. The actor is
/// never notified about their own action, and nobody gets two copies of the
/// same event.
///
/// | Event | Type | Recipients |
/// |---|---|---|
/// | assignee set on create / changed on update | `task_assigned` | assignee |
/// | status changed | `status_changed` | creator, assignee |
/// | task deleted | `status_changed` (no task link) | creator, assignee |
/// | member joined | `team_invite` | team admins |
/// | due-soon sweep | `due_reminder` | assignee |
///
/// Producers run on the caller's connection and return [`BestEffort`]; a
/// failed notification is logged and the surrounding operation carries on.
/// The recipient-facing API lives in [`inbox`].

pub mod inbox;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::best_effort::BestEffort;
use crate::models::membership::TeamMember;
use crate::models::notification::{NewNotification, Notification, NotificationType};
use crate::models::task::{Task, TaskStatus};
use crate::models::team::Team;
use crate::models::user::User;

/// Shown when the actor's account can't be found
const UNKNOWN_ACTOR: &str = "Someone";

/// Creator and assignee, minus the actor, without duplicates
pub fn task_watchers(actor_id: Uuid, creator_id: Uuid, assignee_id: Option<Uuid>) -> Vec<Uuid> {
    let mut recipients = Vec::with_capacity(2);

    for candidate in std::iter::once(creator_id).chain(assignee_id) {
        if candidate != actor_id && !recipients.contains(&candidate) {
            recipients.push(candidate);
        }
    }

    recipients
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in progress",
        TaskStatus::Completed => "completed",
        TaskStatus::Cancelled => "cancelled",
    }
}

async fn display_name(conn: &mut SqliteConnection, user_id: Uuid) -> Result<String, sqlx::Error> {
    Ok(User::find_by_id(conn, user_id)
        .await?
        .map(|user| user.nickname)
        .unwrap_or_else(|| UNKNOWN_ACTOR.to_string()))
}

async fn deliver(
    conn: &mut SqliteConnection,
    batch: Vec<NewNotification>,
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut written = Vec::with_capacity(batch.len());
    for data in batch {
        written.push(Notification::insert(&mut *conn, data).await?);
    }
    Ok(written)
}

/// Notifies the assignee that a task was handed to them
///
/// Silent for unassigned tasks and self-assignment.
pub async fn on_assignment(
    conn: &mut SqliteConnection,
    actor_id: Uuid,
    task: &Task,
) -> BestEffort<Vec<Notification>> {
    let Some(assignee_id) = task.assignee_id.filter(|id| *id != actor_id) else {
        return BestEffort::Skipped;
    };

    let result = async {
        let actor = display_name(&mut *conn, actor_id).await?;
        let notification = NewNotification {
            user_id: assignee_id,
            created_by: Some(actor_id),
            task_id: Some(task.id),
            kind: NotificationType::TaskAssigned,
            content: format!("{} assigned you the task \"{}\"", actor, task.title),
        };
        deliver(&mut *conn, vec![notification]).await
    }
    .await;

    BestEffort::from_result(result, "Assignment notification")
}

/// Notifies creator and assignee that a task changed status
pub async fn on_status_change(
    conn: &mut SqliteConnection,
    actor_id: Uuid,
    task: &Task,
    old: TaskStatus,
    new: TaskStatus,
) -> BestEffort<Vec<Notification>> {
    let recipients = task_watchers(actor_id, task.creator_id, task.assignee_id);
    if recipients.is_empty() || old == new {
        return BestEffort::Skipped;
    }

    let result = async {
        let actor = display_name(&mut *conn, actor_id).await?;
        let content = format!(
            "{} changed \"{}\" from {} to {}",
            actor,
            task.title,
            status_label(old),
            status_label(new)
        );
        let batch = recipients
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                created_by: Some(actor_id),
                task_id: Some(task.id),
                kind: NotificationType::StatusChanged,
                content: content.clone(),
            })
            .collect();
        deliver(&mut *conn, batch).await
    }
    .await;

    BestEffort::from_result(result, "Status change notification")
}

/// Notifies creator and assignee that a task was deleted
///
/// `snapshot` is the task as it was before deletion. The notifications carry
/// no task link since the row is gone.
pub async fn on_deletion(
    conn: &mut SqliteConnection,
    actor_id: Uuid,
    snapshot: &Task,
) -> BestEffort<Vec<Notification>> {
    let recipients = task_watchers(actor_id, snapshot.creator_id, snapshot.assignee_id);
    if recipients.is_empty() {
        return BestEffort::Skipped;
    }

    let result = async {
        let actor = display_name(&mut *conn, actor_id).await?;
        let content = format!("{} deleted the task \"{}\"", actor, snapshot.title);
        let batch = recipients
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                created_by: Some(actor_id),
                task_id: None,
                kind: NotificationType::StatusChanged,
                content: content.clone(),
            })
            .collect();
        deliver(&mut *conn, batch).await
    }
    .await;

    BestEffort::from_result(result, "Deletion notification")
}

/// Tells a team's admins that someone joined through the invite code
pub async fn on_member_joined(
    conn: &mut SqliteConnection,
    team: &Team,
    joiner_id: Uuid,
) -> BestEffort<Vec<Notification>> {
    let result = async {
        let admins: Vec<Uuid> = TeamMember::list_admin_ids(&mut *conn, team.id)
            .await?
            .into_iter()
            .filter(|id| *id != joiner_id)
            .collect();
        if admins.is_empty() {
            return Ok(Vec::new());
        }

        let joiner = display_name(&mut *conn, joiner_id).await?;
        let content = format!("{} joined the team \"{}\"", joiner, team.name);
        let batch = admins
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                created_by: Some(joiner_id),
                task_id: None,
                kind: NotificationType::TeamInvite,
                content: content.clone(),
            })
            .collect();
        deliver(&mut *conn, batch).await
    }
    .await;

    match result {
        Ok(written) if written.is_empty() => BestEffort::Skipped,
        other => BestEffort::from_result(other, "Team join notification"),
    }
}

/// Outcome of one due-reminder sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Open, assigned tasks due inside the window
    pub due: usize,

    /// Reminders written
    pub sent: usize,

    /// Reminders that failed to write
    pub failed: usize,
}

/// True when `due` falls inside `[now, now + look_ahead]`
pub fn is_due_soon(due: DateTime<Utc>, now: DateTime<Utc>, look_ahead: Duration) -> bool {
    now <= due && due <= now + look_ahead
}

/// Writes one `due_reminder` per open, assigned task due within `look_ahead`
///
/// Each run reminds again: two sweeps inside one window produce two
/// reminders for the same task. Reminders have no actor.
///
/// # Errors
///
/// Fails only if the task scan itself fails; individual reminder writes are
/// best-effort and counted in the report.
pub async fn sweep_due_reminders(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    look_ahead: Duration,
) -> Result<SweepReport, sqlx::Error> {
    let candidates = Task::list_open_assigned_with_due_date(pool).await?;
    let mut report = SweepReport::default();

    for task in candidates {
        let (Some(assignee_id), Some(due)) = (task.assignee_id, task.due_date) else {
            continue;
        };
        if task.status.is_terminal() || !is_due_soon(due, now, look_ahead) {
            continue;
        }
        report.due += 1;

        let reminder = NewNotification {
            user_id: assignee_id,
            created_by: None,
            task_id: Some(task.id),
            kind: NotificationType::DueReminder,
            content: format!(
                "\"{}\" is due {}",
                task.title,
                due.format("%Y-%m-%d %H:%M UTC")
            ),
        };

        let outcome = BestEffort::from_result(
            Notification::insert(pool, reminder).await,
            "Due reminder",
        );
        if outcome.is_written() {
            report.sent += 1;
        } else {
            report.failed += 1;
        }
    }

    tracing::info!(
        due = report.due,
        sent = report.sent,
        failed = report.failed,
        look_ahead_hours = look_ahead.num_hours(),
        "Due reminder sweep finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchers_exclude_actor() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();

        assert_eq!(task_watchers(creator, creator, Some(assignee)), vec![assignee]);
        assert_eq!(task_watchers(assignee, creator, Some(assignee)), vec![creator]);
    }

    #[test]
    fn test_watchers_deduplicate() {
        let owner = Uuid::new_v4();
        let actor = Uuid::new_v4();

        assert_eq!(task_watchers(actor, owner, Some(owner)), vec![owner]);
        assert!(task_watchers(owner, owner, Some(owner)).is_empty());
        assert!(task_watchers(owner, owner, None).is_empty());
    }

    #[test]
    fn test_due_window_bounds() {
        let now = Utc::now();
        let day = Duration::hours(24);

        assert!(is_due_soon(now, now, day));
        assert!(is_due_soon(now + day, now, day));
        assert!(is_due_soon(now + Duration::hours(3), now, day));
        assert!(!is_due_soon(now - Duration::seconds(1), now, day));
        assert!(!is_due_soon(now + day + Duration::seconds(1), now, day));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(TaskStatus::InProgress), "in progress");
        assert_eq!(status_label(TaskStatus::Cancelled), "cancelled");
    }
}
