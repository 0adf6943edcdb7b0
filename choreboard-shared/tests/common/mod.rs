//! Shared helpers for integration tests
//!
//! Every test gets its own in-memory database with migrations applied, so
//! tests can run in parallel without any external service.

#![allow(dead_code)]

use choreboard_shared::auth::context::RequestContext;
use choreboard_shared::db::migrations::run_migrations;
use choreboard_shared::db::pool::create_memory_pool;
use choreboard_shared::models::task::Task;
use choreboard_shared::registration::{register, RegisterInput, Registration, RegistrationMode};
use choreboard_shared::registry::{create_task, NewTaskInput};
use sqlx::SqlitePool;

pub const PASSWORD: &str = "secret123";

pub async fn setup() -> SqlitePool {
    let pool = create_memory_pool().await.expect("Failed to create memory pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Registers a user who founds `team_name`
pub async fn founder(pool: &SqlitePool, username: &str, team_name: &str) -> Registration {
    register(
        pool,
        RegisterInput {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Create {
                team_name: team_name.to_string(),
            },
        },
    )
    .await
    .expect("Failed to register founder")
}

/// Registers a user who joins the team behind `invite_code`
pub async fn joiner(pool: &SqlitePool, username: &str, invite_code: &str) -> Registration {
    register(
        pool,
        RegisterInput {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            nickname: None,
            mode: RegistrationMode::Join {
                invite_code: invite_code.to_string(),
            },
        },
    )
    .await
    .expect("Failed to register joiner")
}

pub fn ctx(registration: &Registration) -> RequestContext {
    RequestContext::new(registration.user.id, Some(registration.team.id))
}

/// Creates a task with just a title
pub async fn task(pool: &SqlitePool, ctx: &RequestContext, title: &str) -> Task {
    create_task(
        pool,
        ctx,
        NewTaskInput {
            title: title.to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to create task")
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

/// Makes every insert into `table` fail
pub async fn reject_inserts(pool: &SqlitePool, table: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER reject_{table} BEFORE INSERT ON {table}
         BEGIN SELECT RAISE(ABORT, '{table} unavailable'); END"
    ))
    .execute(pool)
    .await
    .expect("Failed to install trigger");
}
