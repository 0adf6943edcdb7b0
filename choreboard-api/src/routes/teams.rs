/// Team endpoints
///
/// - `GET /teams` - the caller's teams
/// - `GET /teams?id=X&action=members` - roster, admins first
/// - `POST /teams` - create a team and switch to it
/// - `POST /teams?action=join` - join by invite code
/// - `POST /teams?action=switch` - change the current team
/// - `POST /teams?id=X&action=regenerate_code` - new invite code (admin)
/// - `POST /teams?id=X&action=remove_member` - drop a member (admin)
/// - `POST /teams?id=X&action=set_role` - promote/demote a member (admin)
/// - `PUT /teams?id=X` - rename (admin)
/// - `DELETE /teams?id=X` - delete (admin, not your only team)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, OptionalJson},
    routes::{message, success, unknown_action, validate, ActionQuery, Envelope, Message},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use choreboard_shared::{
    auth::context::RequestContext,
    directory::teams,
    models::{
        membership::{MemberProfile, TeamMember, TeamRole, TeamWithRole},
        team::Team,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Union of every `POST /teams` body; each action reads its own fields
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TeamActionRequest {
    #[validate(length(min = 1, max = 100, message = "Team name must be 1-100 characters"))]
    pub name: Option<String>,

    pub invite_code: Option<String>,
    pub team_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameTeamRequest {
    #[validate(length(min = 1, max = 100, message = "Team name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TeamsPayload {
    pub teams: Vec<TeamWithRole>,
    pub current_team_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TeamPayload {
    pub team: Team,
}

#[derive(Debug, Serialize)]
pub struct MembersPayload {
    pub members: Vec<MemberProfile>,
}

#[derive(Debug, Serialize)]
pub struct InviteCodePayload {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct MemberPayload {
    pub member: TeamMember,
}

fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Missing {}", field)))
}

pub async fn get_teams(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> ApiResult<Response> {
    match query.action() {
        Some("members") => {
            let members = teams::list_members(&state.db, &ctx, query.require_id()?).await?;
            Ok(success(MembersPayload { members }).into_response())
        }
        None => {
            let teams = teams::list_teams(&state.db, &ctx).await?;
            Ok(success(TeamsPayload {
                teams,
                current_team_id: ctx.current_team_id,
            })
            .into_response())
        }
        other => Err(unknown_action(other)),
    }
}

/// Team actions
///
/// # Endpoint
///
/// ```text
/// POST /teams                                  { "name": "Cabin" }
/// POST /teams?action=join                      { "invite_code": "K7PX2Q" }
/// POST /teams?action=switch                    { "team_id": "<uuid>" }
/// POST /teams?id=<uuid>&action=regenerate_code
/// POST /teams?id=<uuid>&action=remove_member   { "user_id": "<uuid>" }
/// POST /teams?id=<uuid>&action=set_role        { "user_id": "<uuid>", "role": "admin" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, self-removal, own role change
/// - `403 Forbidden`: admin-only action by a member, or not a member
/// - `404 Not Found`: unknown invite code, or target not a member
/// - `409 Conflict`: already a member of the team being joined
pub async fn post_action(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ActionQuery>,
    body: OptionalJson<TeamActionRequest>,
) -> ApiResult<Response> {
    let req = body.into_inner().unwrap_or_default();
    validate(&req)?;

    match query.action() {
        None => {
            let name = required(req.name, "name")?;
            let team = teams::create_team(&state.db, &ctx, &name).await?;
            Ok((StatusCode::CREATED, success(TeamPayload { team })).into_response())
        }
        Some("join") => {
            let code = required(req.invite_code, "invite_code")?;
            let team = teams::join_team(&state.db, &ctx, &code).await?;
            Ok(success(TeamPayload { team }).into_response())
        }
        Some("switch") => {
            let team_id = required(req.team_id.or(query.id), "team_id")?;
            let team = teams::switch_current_team(&state.db, &ctx, team_id).await?;
            Ok(success(TeamPayload { team }).into_response())
        }
        Some("regenerate_code") => {
            let invite_code =
                teams::regenerate_invite_code(&state.db, &ctx, query.require_id()?).await?;
            Ok(success(InviteCodePayload { invite_code }).into_response())
        }
        Some("remove_member") => {
            let user_id = required(req.user_id, "user_id")?;
            teams::remove_member(&state.db, &ctx, query.require_id()?, user_id).await?;
            Ok(message("Member removed").into_response())
        }
        Some("set_role") => {
            let user_id = required(req.user_id, "user_id")?;
            let role = required(req.role, "role")?;
            let member =
                teams::set_member_role(&state.db, &ctx, query.require_id()?, user_id, role).await?;
            Ok(success(MemberPayload { member }).into_response())
        }
        other => Err(unknown_action(other)),
    }
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ActionQuery>,
    ApiJson(req): ApiJson<RenameTeamRequest>,
) -> ApiResult<Json<Envelope<TeamPayload>>> {
    validate(&req)?;

    let team = teams::update_team(&state.db, &ctx, query.require_id()?, &req.name).await?;
    Ok(success(TeamPayload { team }))
}

/// Delete a team
///
/// # Errors
///
/// - `400 Bad Request`: it's the caller's only team
/// - `403 Forbidden`: caller isn't an admin of it
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> ApiResult<Json<Envelope<Message>>> {
    teams::delete_team(&state.db, &ctx, query.require_id()?).await?;
    Ok(message("Team deleted"))
}
