/// Team Directory
///
/// Membership lookups and mutations, the current-team pointer and invite
/// codes. The functions in this module are plain store operations with no
/// permission checks; [`teams`] layers the request-facing team operations on
/// top of them and does the checking.
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::directory::{add_user_to_team, is_team_admin};
/// use choreboard_shared::models::membership::TeamRole;
/// use sqlx::SqlitePool;
/// use uuid::Uuid;
///
/// # async fn example(pool: SqlitePool, user_id: Uuid, team_id: Uuid) -> Result<(), sqlx::Error> {
/// if add_user_to_team(&pool, user_id, team_id, TeamRole::Member).await? {
///     println!("joined");
/// }
/// assert!(!is_team_admin(&pool, user_id, team_id).await?);
/// # Ok(())
/// # }
/// ```

pub mod invite_code;
pub mod teams;

use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::{ServiceError, ServiceResult};
use crate::models::membership::{MemberProfile, TeamMember, TeamRole, TeamWithRole};
use crate::models::user::User;

pub async fn is_team_member<'e, E>(db: E, user_id: Uuid, team_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    Ok(get_user_role(db, user_id, team_id).await?.is_some())
}

pub async fn is_team_admin<'e, E>(db: E, user_id: Uuid, team_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    Ok(get_user_role(db, user_id, team_id)
        .await?
        .is_some_and(|role| role.is_admin()))
}

/// The user's role in a team, `None` if they aren't a member
pub async fn get_user_role<'e, E>(
    db: E,
    user_id: Uuid,
    team_id: Uuid,
) -> Result<Option<TeamRole>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    TeamMember::get_role(db, team_id, user_id).await
}

/// Adds a membership; `false` if the user is already a member
pub async fn add_user_to_team<'e, E>(
    db: E,
    user_id: Uuid,
    team_id: Uuid,
    role: TeamRole,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    match TeamMember::create(db, team_id, user_id, role).await {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes a membership; `false` if there was none
pub async fn remove_user_from_team<'e, E>(
    db: E,
    user_id: Uuid,
    team_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    TeamMember::delete(db, team_id, user_id).await
}

/// Points the user's current team at `team_id`
///
/// # Errors
///
/// Returns `ServiceError::Authorization` if the user isn't a member of the team.
pub async fn switch_team(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    team_id: Uuid,
) -> ServiceResult<()> {
    if !is_team_member(&mut *conn, user_id, team_id).await? {
        return Err(ServiceError::forbidden("You are not a member of this team"));
    }

    User::set_current_team(&mut *conn, user_id, Some(team_id)).await?;
    tracing::debug!(user_id = %user_id, team_id = %team_id, "Switched current team");
    Ok(())
}

/// Teams of a user with their role and member count, oldest membership first
pub async fn get_user_teams<'e, E>(db: E, user_id: Uuid) -> Result<Vec<TeamWithRole>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    TeamMember::list_teams_for_user(db, user_id).await
}

/// Roster of a team, admins first, then by join time
pub async fn get_team_members<'e, E>(db: E, team_id: Uuid) -> Result<Vec<MemberProfile>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    TeamMember::list_profiles(db, team_id).await
}

/// Repoints a user whose current team is gone or left
///
/// Picks their earliest-joined remaining team, or clears the pointer.
pub async fn reassign_current_team(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let next = get_user_teams(&mut *conn, user_id)
        .await?
        .first()
        .map(|team| team.id);

    User::set_current_team(&mut *conn, user_id, next).await?;
    Ok(next)
}
