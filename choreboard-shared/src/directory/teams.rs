/// Team operations on behalf of a signed-in user
///
/// Each operation checks the caller's membership or admin role first, then
/// runs its writes in one transaction. While a transaction is open every
/// statement goes through it, never through the pool.

use sqlx::SqlitePool;
use uuid::Uuid;

use super::invite_code::{generate_invite_code, normalize_invite_code};
use super::{
    add_user_to_team, get_team_members, get_user_teams, reassign_current_team,
    remove_user_from_team, switch_team,
};
use crate::auth::authorization::{require_admin, require_member};
use crate::auth::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::fanout;
use crate::models::membership::{MemberProfile, TeamMember, TeamRole, TeamWithRole};
use crate::models::team::{CreateTeam, Team};
use crate::models::user::User;

/// Maximum team name length in characters
pub const MAX_TEAM_NAME_LENGTH: usize = 100;

const TEAM_NOT_FOUND: &str = "Team not found";

/// Trims a team name and checks its length
pub fn validate_team_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ServiceError::validation("Team name is required"));
    }
    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(ServiceError::validation(format!(
            "Team name must be at most {} characters",
            MAX_TEAM_NAME_LENGTH
        )));
    }

    Ok(name.to_string())
}

/// Teams the caller belongs to
pub async fn list_teams(pool: &SqlitePool, ctx: &RequestContext) -> ServiceResult<Vec<TeamWithRole>> {
    Ok(get_user_teams(pool, ctx.user_id).await?)
}

/// Creates a team with the caller as its admin and switches to it
pub async fn create_team(pool: &SqlitePool, ctx: &RequestContext, name: &str) -> ServiceResult<Team> {
    let name = validate_team_name(name)?;

    let mut tx = pool.begin().await?;

    let invite_code = generate_invite_code(&mut tx).await?;
    let team = Team::create(
        &mut *tx,
        CreateTeam {
            name,
            invite_code,
            created_by: ctx.user_id,
        },
    )
    .await
    .map_err(|e| ServiceError::conflict_on_unique(e, "Invite code collision, please retry"))?;

    TeamMember::create(&mut *tx, team.id, ctx.user_id, TeamRole::Admin).await?;
    User::set_current_team(&mut *tx, ctx.user_id, Some(team.id)).await?;

    tx.commit().await?;

    tracing::info!(team_id = %team.id, user_id = %ctx.user_id, "Team created");
    Ok(team)
}

/// Renames a team (admin only)
pub async fn update_team(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
    name: &str,
) -> ServiceResult<Team> {
    let name = validate_team_name(name)?;
    require_admin(pool, team_id, ctx.user_id).await?;

    Team::rename(pool, team_id, &name)
        .await?
        .ok_or_else(|| ServiceError::not_found(TEAM_NOT_FOUND))
}

/// Deletes a team (admin only)
///
/// Refused while it's the caller's only team. Memberships, tasks and
/// categories go with it; everyone who was working in it is moved to their
/// earliest remaining team.
pub async fn delete_team(pool: &SqlitePool, ctx: &RequestContext, team_id: Uuid) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    require_admin(&mut *tx, team_id, ctx.user_id).await?;

    if TeamMember::count_by_user(&mut *tx, ctx.user_id).await? < 2 {
        return Err(ServiceError::validation(
            "You cannot delete your only team; create or join another team first",
        ));
    }

    let displaced = User::list_ids_by_current_team(&mut *tx, team_id).await?;

    if !Team::delete(&mut *tx, team_id).await? {
        return Err(ServiceError::not_found(TEAM_NOT_FOUND));
    }

    for user_id in &displaced {
        reassign_current_team(&mut tx, *user_id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        team_id = %team_id,
        user_id = %ctx.user_id,
        displaced = displaced.len(),
        "Team deleted"
    );
    Ok(())
}

/// Joins a team by invite code and switches to it
///
/// The team's admins are notified (best-effort).
pub async fn join_team(
    pool: &SqlitePool,
    ctx: &RequestContext,
    invite_code: &str,
) -> ServiceResult<Team> {
    let code = normalize_invite_code(invite_code);
    if code.is_empty() {
        return Err(ServiceError::validation("Invite code is required"));
    }

    let mut tx = pool.begin().await?;

    let team = Team::find_by_invite_code(&mut *tx, &code)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invalid invite code"))?;

    if !add_user_to_team(&mut *tx, ctx.user_id, team.id, TeamRole::Member).await? {
        return Err(ServiceError::Conflict(
            "You are already a member of this team".to_string(),
        ));
    }
    User::set_current_team(&mut *tx, ctx.user_id, Some(team.id)).await?;

    let _ = fanout::on_member_joined(&mut tx, &team, ctx.user_id).await;

    tx.commit().await?;

    tracing::info!(team_id = %team.id, user_id = %ctx.user_id, "Joined team");
    Ok(team)
}

/// Makes `team_id` the caller's current team
pub async fn switch_current_team(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
) -> ServiceResult<Team> {
    let mut tx = pool.begin().await?;

    switch_team(&mut tx, ctx.user_id, team_id).await?;
    let team = Team::find_by_id(&mut *tx, team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(TEAM_NOT_FOUND))?;

    tx.commit().await?;
    Ok(team)
}

/// Replaces the team's invite code (admin only), returns the new code
pub async fn regenerate_invite_code(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
) -> ServiceResult<String> {
    let mut tx = pool.begin().await?;

    require_admin(&mut *tx, team_id, ctx.user_id).await?;

    let code = generate_invite_code(&mut tx).await?;
    let team = Team::set_invite_code(&mut *tx, team_id, &code)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Invite code collision, please retry"))?
        .ok_or_else(|| ServiceError::not_found(TEAM_NOT_FOUND))?;

    tx.commit().await?;

    tracing::info!(team_id = %team_id, user_id = %ctx.user_id, "Invite code regenerated");
    Ok(team.invite_code)
}

/// Roster of a team the caller belongs to
pub async fn list_members(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
) -> ServiceResult<Vec<MemberProfile>> {
    require_member(pool, team_id, ctx.user_id).await?;
    Ok(get_team_members(pool, team_id).await?)
}

/// Removes another member (admin only)
///
/// Admins can't remove themselves; they delete the team instead.
pub async fn remove_member(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    require_admin(&mut *tx, team_id, ctx.user_id).await?;

    if user_id == ctx.user_id {
        return Err(ServiceError::validation(
            "You cannot remove yourself; delete the team instead",
        ));
    }

    if !remove_user_from_team(&mut *tx, user_id, team_id).await? {
        return Err(ServiceError::not_found("User is not a member of this team"));
    }

    let removed_current = User::find_by_id(&mut *tx, user_id)
        .await?
        .is_some_and(|user| user.current_team_id == Some(team_id));
    if removed_current {
        reassign_current_team(&mut tx, user_id).await?;
    }

    tx.commit().await?;

    tracing::info!(team_id = %team_id, user_id = %user_id, removed_by = %ctx.user_id, "Member removed");
    Ok(())
}

/// Changes another member's role (admin only)
pub async fn set_member_role(
    pool: &SqlitePool,
    ctx: &RequestContext,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> ServiceResult<TeamMember> {
    require_admin(pool, team_id, ctx.user_id).await?;

    if user_id == ctx.user_id {
        return Err(ServiceError::validation("You cannot change your own role"));
    }

    let member = TeamMember::update_role(pool, team_id, user_id, role)
        .await?
        .ok_or_else(|| ServiceError::not_found("User is not a member of this team"))?;

    tracing::info!(team_id = %team_id, user_id = %user_id, role = role.as_str(), "Member role changed");
    Ok(member)
}
