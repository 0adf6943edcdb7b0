/// Authorization helpers
///
/// Two roles exist per team: `admin` and `member`. Every team-scoped operation
/// starts with one of the checks below, before any write.
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::auth::authorization::{require_admin, require_member};
/// use choreboard_shared::auth::context::RequestContext;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool, ctx: RequestContext) -> Result<(), Box<dyn std::error::Error>> {
/// let team_id = ctx.team_id()?;
/// require_member(&pool, team_id, ctx.user_id).await?;
/// require_admin(&pool, team_id, ctx.user_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::directory::get_user_role;
use crate::error::{ServiceError, ServiceResult};
use crate::models::membership::TeamRole;

/// Requires membership in a team, returns the caller's role
///
/// # Errors
///
/// Returns `ServiceError::Authorization` if the user is not a member
pub async fn require_member<'e, E>(db: E, team_id: Uuid, user_id: Uuid) -> ServiceResult<TeamRole>
where
    E: SqliteExecutor<'e>,
{
    get_user_role(db, user_id, team_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(team_id = %team_id, user_id = %user_id, "Membership check failed");
            ServiceError::forbidden("You are not a member of this team")
        })
}

/// Requires the admin role in a team
///
/// # Errors
///
/// Returns `ServiceError::Authorization` if the user is not a member or not an admin
pub async fn require_admin<'e, E>(db: E, team_id: Uuid, user_id: Uuid) -> ServiceResult<()>
where
    E: SqliteExecutor<'e>,
{
    let role = require_member(db, team_id, user_id).await?;

    if !role.is_admin() {
        return Err(ServiceError::forbidden("Only team admins can do this"));
    }

    Ok(())
}
