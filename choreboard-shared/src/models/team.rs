/// Team model and database operations
///
/// A team is the tenant boundary: tasks and categories belong to exactly one
/// team, and users reach them through a membership row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id BLOB PRIMARY KEY NOT NULL,
///     name TEXT NOT NULL,
///     invite_code TEXT NOT NULL,         -- UNIQUE index teams_invite_code_key
///     created_by BLOB NOT NULL REFERENCES users(id),
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```
///
/// The unique index on `invite_code` is what actually guarantees uniqueness;
/// the existence check in `directory::invite_code` only makes collisions rare.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

const TEAM_COLUMNS: &str = "id, name, invite_code, created_by, created_at, updated_at";

/// Team (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,

    /// 6-character join code
    pub invite_code: String,

    /// User who created the team
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team
#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub invite_code: String,
    pub created_by: Uuid,
}

impl Team {
    /// Creates a new team
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the invite code is already taken.
    pub async fn create<'e, E>(db: E, data: CreateTeam) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Team>(&format!(
            "INSERT INTO teams (id, name, invite_code, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {TEAM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.invite_code)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id<'e, E>(db: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Resolves an invite code to its team
    pub async fn find_by_invite_code<'e, E>(
        db: E,
        invite_code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE invite_code = ?"
        ))
        .bind(invite_code)
        .fetch_optional(db)
        .await
    }

    /// Checks whether any team currently holds `invite_code`
    pub async fn invite_code_exists<'e, E>(db: E, invite_code: &str) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE invite_code = ?)")
            .bind(invite_code)
            .fetch_one(db)
            .await
    }

    /// Renames a team
    pub async fn rename<'e, E>(db: E, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET name = ?, updated_at = ? WHERE id = ? RETURNING {TEAM_COLUMNS}"
        ))
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Replaces the invite code
    pub async fn set_invite_code<'e, E>(
        db: E,
        id: Uuid,
        invite_code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET invite_code = ?, updated_at = ? WHERE id = ? RETURNING {TEAM_COLUMNS}"
        ))
        .bind(invite_code)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Deletes a team
    ///
    /// Memberships, tasks and categories cascade; users pointing at the team
    /// have their `current_team_id` nulled by the foreign key.
    pub async fn delete<'e, E>(db: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all teams
    pub async fn count<'e, E>(db: E) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM teams").fetch_one(db).await
    }
}
