/// Integration tests for tasks, categories and the task history ledger

mod common;

use chrono::{Duration, Utc};
use choreboard_shared::error::ServiceError;
use choreboard_shared::models::task::{TaskFilter, TaskPriority, TaskStatus};
use choreboard_shared::models::task_history::HistoryAction;
use choreboard_shared::registry::{
    create_category, create_task, delete_category, delete_task, get_task, list_categories,
    list_tasks, task_history, update_category, update_task, CategoryInput, CategoryPatch,
    NewTaskInput, TaskPatch,
};
use common::{count, ctx, founder, joiner, reject_inserts, setup, task};

fn titled(title: &str, priority: TaskPriority) -> NewTaskInput {
    NewTaskInput {
        title: title.to_string(),
        priority: Some(priority),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_tasks_listed_by_priority_then_newest() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);

    create_task(&pool, &ctx, titled("A", TaskPriority::High)).await.unwrap();
    create_task(&pool, &ctx, titled("C", TaskPriority::Medium)).await.unwrap();
    create_task(&pool, &ctx, titled("B", TaskPriority::High)).await.unwrap();
    create_task(&pool, &ctx, titled("D", TaskPriority::Low)).await.unwrap();

    let tasks = list_tasks(&pool, &ctx, &TaskFilter::default()).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "A", "C", "D"]);
}

#[tokio::test]
async fn test_create_task_defaults_and_validation() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);

    let created = task(&pool, &ctx, "  Take out bins ").await;
    assert_eq!(created.title, "Take out bins");
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.priority, TaskPriority::Medium);
    assert_eq!(created.creator_id, alice.user.id);
    assert_eq!(created.team_id, alice.team.id);
    assert!(created.completed_at.is_none());

    let blank = create_task(&pool, &ctx, titled("   ", TaskPriority::Low)).await;
    assert!(matches!(blank, Err(ServiceError::Validation(_))));
    assert_eq!(count(&pool, "tasks").await, 1);
}

#[tokio::test]
async fn test_task_created_completed_is_stamped() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;

    let done = create_task(
        &pool,
        &ctx(&alice),
        NewTaskInput {
            title: "Already done".to_string(),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn test_completed_at_stamped_on_completion_and_kept() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);
    let chore = task(&pool, &ctx, "Vacuum").await;

    let started = update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(started.completed_at.is_none());

    let done = update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let stamped = done.completed_at.expect("completed_at should be set");

    let reopened = update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            status: Some(TaskStatus::Pending),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.completed_at, Some(stamped));
}

#[tokio::test]
async fn test_patch_null_clears_and_absent_keeps() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx = ctx(&alice);

    let due = Utc::now() + Duration::days(2);
    let chore = create_task(
        &pool,
        &ctx,
        NewTaskInput {
            title: "Water plants".to_string(),
            description: Some("Balcony too".to_string()),
            assignee_id: Some(bob.user.id),
            due_date: Some(due),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let patch: TaskPatch = serde_json::from_value(serde_json::json!({ "assignee_id": null })).unwrap();
    let updated = update_task(&pool, &ctx, chore.id, patch).await.unwrap();

    assert_eq!(updated.assignee_id, None);
    assert_eq!(updated.description.as_deref(), Some("Balcony too"));
    assert!(updated.due_date.is_some());
}

#[tokio::test]
async fn test_assignee_and_category_must_belong_to_team() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let outsider = founder(&pool, "bob", "Elsewhere").await;
    let ctx_alice = ctx(&alice);

    let foreign_category = create_category(
        &pool,
        &ctx(&outsider),
        CategoryInput {
            name: "Garden".to_string(),
            color: None,
        },
    )
    .await
    .unwrap();

    let bad_assignee = create_task(
        &pool,
        &ctx_alice,
        NewTaskInput {
            title: "Mow".to_string(),
            assignee_id: Some(outsider.user.id),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_assignee, Err(ServiceError::Validation(_))));

    let bad_category = create_task(
        &pool,
        &ctx_alice,
        NewTaskInput {
            title: "Mow".to_string(),
            category_id: Some(foreign_category.id),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_category, Err(ServiceError::Validation(_))));
    assert_eq!(count(&pool, "tasks").await, 0);
}

#[tokio::test]
async fn test_tasks_are_invisible_across_teams() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let outsider = founder(&pool, "bob", "Elsewhere").await;
    let ctx_bob = ctx(&outsider);

    let chore = task(&pool, &ctx(&alice), "Dishes").await;

    assert!(matches!(get_task(&pool, &ctx_bob, chore.id).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(
        update_task(
            &pool,
            &ctx_bob,
            chore.id,
            TaskPatch {
                title: Some("Mine".to_string()),
                ..Default::default()
            }
        )
        .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(delete_task(&pool, &ctx_bob, chore.id).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(task_history(&pool, &ctx_bob, chore.id).await, Err(ServiceError::NotFound(_))));

    assert!(list_tasks(&pool, &ctx_bob, &TaskFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx = ctx(&alice);

    let kitchen = create_category(
        &pool,
        &ctx,
        CategoryInput {
            name: "Kitchen".to_string(),
            color: Some("#FF0000".to_string()),
        },
    )
    .await
    .unwrap();

    create_task(
        &pool,
        &ctx,
        NewTaskInput {
            title: "Dishes".to_string(),
            assignee_id: Some(bob.user.id),
            category_id: Some(kitchen.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    create_task(
        &pool,
        &ctx,
        NewTaskInput {
            title: "Laundry".to_string(),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let by_assignee = TaskFilter {
        assignee_id: Some(bob.user.id),
        ..Default::default()
    };
    let by_status = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    let by_category = TaskFilter {
        category_id: Some(kitchen.id),
        ..Default::default()
    };

    let titles = |tasks: Vec<choreboard_shared::models::task::Task>| {
        tasks.into_iter().map(|t| t.title).collect::<Vec<_>>()
    };
    assert_eq!(titles(list_tasks(&pool, &ctx, &by_assignee).await.unwrap()), vec!["Dishes"]);
    assert_eq!(titles(list_tasks(&pool, &ctx, &by_status).await.unwrap()), vec!["Laundry"]);
    assert_eq!(titles(list_tasks(&pool, &ctx, &by_category).await.unwrap()), vec!["Dishes"]);
}

#[tokio::test]
async fn test_history_follows_task_lifecycle() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);
    let chore = task(&pool, &ctx, "Clean fridge").await;

    // title and status together: one updated entry and one status entry
    update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            title: Some("Clean the fridge".to_string()),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // status only
    update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // no-op
    update_task(
        &pool,
        &ctx,
        chore.id,
        TaskPatch {
            title: Some("Clean the fridge".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let history = task_history(&pool, &ctx, chore.id).await.unwrap();
    let mut actions: Vec<HistoryAction> = history.iter().map(|h| h.action).collect();
    actions.sort_by_key(|a| a.as_str());
    assert_eq!(
        actions,
        vec![
            HistoryAction::Created,
            HistoryAction::StatusChanged,
            HistoryAction::StatusChanged,
            HistoryAction::Updated,
        ]
    );
    assert_eq!(history.last().map(|h| h.action), Some(HistoryAction::Created));
    assert!(history.iter().all(|h| h.nickname.as_deref() == Some("alice")));

    let updated = history
        .iter()
        .find(|h| h.action == HistoryAction::Updated)
        .and_then(|h| h.changes.as_ref())
        .expect("updated entry carries changes");
    assert_eq!(updated.0["title"]["old"], "Clean fridge");
    assert_eq!(updated.0["title"]["new"], "Clean the fridge");
    assert_eq!(updated.0["status"]["new"], "in_progress");

    delete_task(&pool, &ctx, chore.id).await.unwrap();

    assert_eq!(count(&pool, "tasks").await, 0);
    assert_eq!(count(&pool, "task_history").await, 5);
    assert!(matches!(task_history(&pool, &ctx, chore.id).await, Err(ServiceError::NotFound(_))));

    let (action, changes): (String, String) = sqlx::query_as(
        "SELECT action, changes FROM task_history WHERE task_id = ? AND action = 'deleted'",
    )
    .bind(chore.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(action, "deleted");
    let snapshot: serde_json::Value = serde_json::from_str(&changes).unwrap();
    assert_eq!(snapshot["title"], "Clean the fridge");
    assert_eq!(snapshot["status"], "completed");
}

#[tokio::test]
async fn test_categories() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let bob = joiner(&pool, "bob", &alice.team.invite_code).await;
    let ctx_alice = ctx(&alice);
    let ctx_bob = ctx(&bob);

    let member_attempt = create_category(
        &pool,
        &ctx_bob,
        CategoryInput {
            name: "Bathroom".to_string(),
            color: None,
        },
    )
    .await;
    assert!(matches!(member_attempt, Err(ServiceError::Authorization(_))));

    let bad_color = create_category(
        &pool,
        &ctx_alice,
        CategoryInput {
            name: "Bathroom".to_string(),
            color: Some("blue".to_string()),
        },
    )
    .await;
    assert!(matches!(bad_color, Err(ServiceError::Validation(_))));

    let bathroom = create_category(
        &pool,
        &ctx_alice,
        CategoryInput {
            name: "Bathroom".to_string(),
            color: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(bathroom.color, "#4A90E2");

    let duplicate = create_category(
        &pool,
        &ctx_alice,
        CategoryInput {
            name: "Bathroom".to_string(),
            color: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

    let recolored = update_category(
        &pool,
        &ctx_alice,
        bathroom.id,
        CategoryPatch {
            name: None,
            color: Some("#00AA00".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(recolored.name, "Bathroom");
    assert_eq!(recolored.color, "#00AA00");

    create_task(
        &pool,
        &ctx_bob,
        NewTaskInput {
            title: "Scrub tub".to_string(),
            category_id: Some(bathroom.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let listed = list_categories(&pool, &ctx_bob).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].task_count, 1);
}

#[tokio::test]
async fn test_deleting_category_keeps_tasks() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);

    let kitchen = create_category(
        &pool,
        &ctx,
        CategoryInput {
            name: "Kitchen".to_string(),
            color: None,
        },
    )
    .await
    .unwrap();

    let chore = create_task(
        &pool,
        &ctx,
        NewTaskInput {
            title: "Descale kettle".to_string(),
            category_id: Some(kitchen.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    delete_category(&pool, &ctx, kitchen.id).await.unwrap();

    let after = get_task(&pool, &ctx, chore.id).await.unwrap();
    assert_eq!(after.category_id, None);
    assert_eq!(count(&pool, "categories").await, 0);
    assert!(matches!(
        delete_category(&pool, &ctx, kitchen.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_task_operations_need_a_current_team() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let no_team = choreboard_shared::auth::context::RequestContext::new(alice.user.id, None);

    assert!(matches!(
        list_tasks(&pool, &no_team, &TaskFilter::default()).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_task_writes_commit_when_history_is_unavailable() {
    let pool = setup().await;
    let alice = founder(&pool, "alice", "Home").await;
    let ctx = ctx(&alice);
    reject_inserts(&pool, "task_history").await;

    let chore = task(&pool, &ctx, "Mop floor").await;
    assert_eq!(count(&pool, "tasks").await, 1);

    let patch = TaskPatch {
        title: Some("Mop kitchen floor".to_string()),
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    let updated = update_task(&pool, &ctx, chore.id, patch).await.unwrap();
    assert_eq!(updated.title, "Mop kitchen floor");

    let stored = get_task(&pool, &ctx, chore.id).await.unwrap();
    assert_eq!(stored.title, "Mop kitchen floor");
    assert_eq!(stored.status, TaskStatus::Completed);
    assert!(stored.completed_at.is_some());

    delete_task(&pool, &ctx, chore.id).await.unwrap();
    assert_eq!(count(&pool, "tasks").await, 0);
    assert_eq!(count(&pool, "task_history").await, 0);
}
