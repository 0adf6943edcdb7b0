/// User model and database operations
///
/// Users belong to one or more teams via the `team_members` table and carry a
/// pointer to the team they are currently working in.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BLOB PRIMARY KEY NOT NULL,
///     username TEXT NOT NULL,            -- unique
///     password_hash TEXT NOT NULL,
///     nickname TEXT NOT NULL,
///     role TEXT NOT NULL DEFAULT 'user',
///     current_team_id BLOB REFERENCES teams(id) ON DELETE SET NULL,
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::models::user::{User, CreateUser};
/// use choreboard_shared::db::pool::create_memory_pool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_memory_pool().await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     nickname: "Alice".to_string(),
/// }).await?;
///
/// let found = User::find_by_username(&pool, "alice").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

/// Legacy global role stored on every account
///
/// Authorization uses the per-team role in `team_members`; this column is
/// kept for display only.
pub const LEGACY_ROLE: &str = "user";

const USER_COLUMNS: &str =
    "id, username, password_hash, nickname, role, current_team_id, created_at, updated_at";

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub nickname: String,

    /// Legacy global role
    pub role: String,

    /// Team the user is currently operating within
    pub current_team_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub nickname: String,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username already exists (unique constraint
    /// violation) or the database fails.
    pub async fn create<'e, E>(db: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, password_hash, nickname, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.nickname)
        .bind(LEGACY_ROLE)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(db: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username<'e, E>(
        db: E,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
    }

    /// Checks whether a username is taken
    pub async fn username_exists<'e, E>(db: E, username: &str) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(db)
            .await
    }

    /// Points the user at a team (or at none)
    ///
    /// Membership is not checked here; see `directory::switch_team`.
    pub async fn set_current_team<'e, E>(
        db: E,
        id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result =
            sqlx::query("UPDATE users SET current_team_id = ?, updated_at = ? WHERE id = ?")
                .bind(team_id)
                .bind(Utc::now())
                .bind(id)
                .execute(db)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// IDs of users whose current team is `team_id`
    pub async fn list_ids_by_current_team<'e, E>(
        db: E,
        team_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT id FROM users WHERE current_team_id = ?")
            .bind(team_id)
            .fetch_all(db)
            .await
    }

    /// Changes the display name
    pub async fn update_nickname<'e, E>(
        db: E,
        id: Uuid,
        nickname: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET nickname = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(nickname)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Replaces the stored password hash
    pub async fn update_password_hash<'e, E>(
        db: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all users
    pub async fn count<'e, E>(db: E) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(db).await
    }
}
