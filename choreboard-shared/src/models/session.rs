/// Server-side login sessions
///
/// The browser holds an opaque token in a cookie; the database only ever sees
/// its SHA-256 hash (see `auth::session`). Logging out deletes the row, which
/// invalidates the cookie immediately.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id BLOB PRIMARY KEY NOT NULL,
///     token_hash TEXT NOT NULL,          -- unique
///     user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TEXT NOT NULL,
///     expires_at TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,

    /// SHA-256 hex of the cookie token
    pub token_hash: String,

    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub async fn create<'e, E>(
        db: E,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, token_hash, user_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token_hash)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_token_hash<'e, E>(
        db: E,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            "SELECT id, token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await
    }

    /// Deletes a session; false if it didn't exist
    pub async fn delete_by_token_hash<'e, E>(db: E, token_hash: &str) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
