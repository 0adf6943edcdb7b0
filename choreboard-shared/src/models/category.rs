/// Category model and database operations
///
/// Categories tag tasks within a team. Names are unique per team; colors are
/// `#RRGGBB` hex strings.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id BLOB PRIMARY KEY NOT NULL,
///     team_id BLOB NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,                -- UNIQUE (team_id, name)
///     color TEXT NOT NULL,
///     creator_id BLOB NOT NULL REFERENCES users(id),
///     created_at TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

/// Color assigned when the caller doesn't pick one
pub const DEFAULT_COLOR: &str = "#4A90E2";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub color: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Category with the number of tasks currently tagged with it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub color: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub task_count: i64,
}

/// Returns true for `#RRGGBB` (case-insensitive hex)
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Category {
    pub async fn create<'e, E>(
        db: E,
        team_id: Uuid,
        name: &str,
        color: &str,
        creator_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, team_id, name, color, creator_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, team_id, name, color, creator_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(name)
        .bind(color)
        .bind(creator_id)
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    /// Finds a category by ID within a team
    pub async fn find_in_team<'e, E>(
        db: E,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, team_id, name, color, creator_id, created_at
            FROM categories
            WHERE id = ? AND team_id = ?
            "#,
        )
        .bind(id)
        .bind(team_id)
        .fetch_optional(db)
        .await
    }

    /// Lists a team's categories by name, with task counts
    pub async fn list_by_team<'e, E>(
        db: E,
        team_id: Uuid,
    ) -> Result<Vec<CategoryWithCount>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.team_id, c.name, c.color, c.creator_id, c.created_at,
                   (SELECT COUNT(*) FROM tasks t WHERE t.category_id = c.id) AS task_count
            FROM categories c
            WHERE c.team_id = ?
            ORDER BY c.name ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(db)
        .await
    }

    /// Updates name and color
    pub async fn update<'e, E>(
        db: E,
        id: Uuid,
        name: &str,
        color: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = ?, color = ?
            WHERE id = ?
            RETURNING id, team_id, name, color, creator_id, created_at
            "#,
        )
        .bind(name)
        .bind(color)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Clears the category from every task that references it
    pub async fn detach_tasks<'e, E>(db: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("UPDATE tasks SET category_id = NULL WHERE category_id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(db: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
