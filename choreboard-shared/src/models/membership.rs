/// Team membership model and database operations
///
/// Membership is a many-to-many relationship between users and teams with a
/// per-team role. The `(team_id, user_id)` primary key guarantees a user holds
/// at most one role per team.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_members (
///     team_id BLOB NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('admin', 'member')),
///     joined_at TEXT NOT NULL,
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **admin**: manage categories, members, invite code; rename and delete the team
/// - **member**: work with tasks
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::models::membership::{TeamMember, TeamRole};
/// use sqlx::SqlitePool;
/// use uuid::Uuid;
///
/// # async fn example(pool: SqlitePool, team_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// TeamMember::create(&pool, team_id, user_id, TeamRole::Member).await?;
///
/// if let Some(role) = TeamMember::get_role(&pool, team_id, user_id).await? {
///     println!("User role: {}", role.as_str());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;
use uuid::Uuid;

/// Per-team role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Manages the team, its categories and its roster
    Admin,

    /// Works with the team's tasks
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Admin => "admin",
            TeamRole::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, TeamRole::Admin)
    }

    /// Sort key for rosters: admins first
    pub fn roster_rank(&self) -> u8 {
        match self {
            TeamRole::Admin => 0,
            TeamRole::Member => 1,
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Roster entry joined with the user's public profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub username: String,
    pub nickname: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// A team as seen by one of its members
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamWithRole {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,

    /// The viewing user's role
    pub role: TeamRole,

    pub joined_at: DateTime<Utc>,
    pub member_count: i64,
}

impl TeamMember {
    /// Adds a user to a team
    ///
    /// # Errors
    ///
    /// Returns a unique violation when the membership already exists, or a
    /// foreign key violation when the team or user doesn't exist.
    pub async fn create<'e, E>(
        db: E,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Self, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            RETURNING team_id, user_id, role, joined_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    pub async fn find<'e, E>(
        db: E,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT team_id, user_id, role, joined_at
            FROM team_members
            WHERE team_id = ? AND user_id = ?
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Gets user's role in a team, None when not a member
    pub async fn get_role<'e, E>(
        db: E,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamRole>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT role FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    pub async fn update_role<'e, E>(
        db: E,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET role = ?
            WHERE team_id = ? AND user_id = ?
            RETURNING team_id, user_id, role, joined_at
            "#,
        )
        .bind(role)
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Removes a user from a team; false if there was no such membership
    pub async fn delete<'e, E>(db: E, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team_id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Roster of a team, admins first, then by join time
    pub async fn list_profiles<'e, E>(db: E, team_id: Uuid) -> Result<Vec<MemberProfile>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let mut members = sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT m.user_id, u.username, u.nickname, m.role, m.joined_at
            FROM team_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = ?
            "#,
        )
        .bind(team_id)
        .fetch_all(db)
        .await?;

        members.sort_by(|a, b| {
            a.role
                .roster_rank()
                .cmp(&b.role.roster_rank())
                .then(a.joined_at.cmp(&b.joined_at))
        });

        Ok(members)
    }

    /// User IDs of a team's admins
    pub async fn list_admin_ids<'e, E>(db: E, team_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT user_id FROM team_members WHERE team_id = ? AND role = 'admin'")
            .bind(team_id)
            .fetch_all(db)
            .await
    }

    /// Teams a user belongs to, with their role, oldest membership first
    pub async fn list_teams_for_user<'e, E>(
        db: E,
        user_id: Uuid,
    ) -> Result<Vec<TeamWithRole>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let mut teams = sqlx::query_as::<_, TeamWithRole>(
            r#"
            SELECT t.id, t.name, t.invite_code, t.created_by, t.created_at,
                   m.role, m.joined_at,
                   (SELECT COUNT(*) FROM team_members c WHERE c.team_id = t.id) AS member_count
            FROM team_members m
            JOIN teams t ON t.id = m.team_id
            WHERE m.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        teams.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(teams)
    }

    /// Number of teams a user belongs to
    pub async fn count_by_user<'e, E>(db: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db)
            .await
    }
}
