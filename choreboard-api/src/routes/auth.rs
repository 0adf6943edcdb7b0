/// Authentication endpoints
///
/// All live on `/auth`, dispatched on `?action=`:
///
/// - `POST /auth?action=register` - create an account (create or join mode)
/// - `POST /auth?action=login` - sign in
/// - `POST|GET /auth?action=logout` - end the session
/// - `GET /auth?action=check` - report whether the cookie is a live session
/// - `PUT /auth?action=profile` - change nickname and/or password
///
/// Register and login answer with a `Set-Cookie` carrying the session token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, OptionalJson},
    middleware::session::{authenticate, clear_session_cookie, session_cookie, session_token},
    routes::{message, success, unknown_action, validate, ActionQuery},
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use choreboard_shared::{
    auth::{
        context::RequestContext,
        session::{end_session, start_session},
    },
    models::{membership::TeamRole, team::Team, user::User},
    registration::{self, ProfileUpdate, RegisterInput, RegistrationMode},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterMode {
    Create,
    Join,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Display name, defaults to the username
    #[validate(length(max = 50, message = "Nickname must be at most 50 characters"))]
    pub nickname: Option<String>,

    pub mode: RegisterMode,

    /// Required in create mode
    #[validate(length(max = 100, message = "Team name must be at most 100 characters"))]
    pub team_name: Option<String>,

    /// Required in join mode
    pub invite_code: Option<String>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        let mode = match req.mode {
            RegisterMode::Create => RegistrationMode::Create {
                team_name: req.team_name.unwrap_or_default(),
            },
            RegisterMode::Join => RegistrationMode::Join {
                invite_code: req.invite_code.unwrap_or_default(),
            },
        };

        RegisterInput {
            username: req.username,
            password: req.password,
            nickname: req.nickname,
            mode,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Nickname must be 1-50 characters"))]
    pub nickname: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

/// The signed-in user with their current team
#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub user: User,
    pub team: Option<Team>,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Serialize)]
pub struct CheckPayload {
    pub logged_in: bool,

    #[serde(flatten)]
    pub session: Option<SessionPayload>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePayload {
    pub user: User,
}

/// Opens a session and attaches its cookie to `payload`
async fn with_new_session(
    state: &AppState,
    user_id: Uuid,
    payload: SessionPayload,
) -> ApiResult<Response> {
    let session = &state.config.session;
    let token = start_session(&state.db, user_id, session.ttl()).await?;
    let cookie = session_cookie(&token, session.ttl().num_seconds(), session.cookie_secure);

    Ok(([(header::SET_COOKIE, cookie)], success(payload)).into_response())
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth?action=register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "secret123",
///   "nickname": "Alice",
///   "mode": "create",
///   "team_name": "Flat 4B"
/// }
/// ```
///
/// Join mode sends `"mode": "join"` and `"invite_code"` instead of
/// `team_name`.
///
/// # Response
///
/// ```json
/// { "success": true, "user": {...}, "team": {...}, "role": "admin" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `404 Not Found`: unknown invite code
/// - `409 Conflict`: username taken
async fn register(state: &AppState, req: RegisterRequest) -> ApiResult<Response> {
    validate(&req)?;

    let registration = registration::register(&state.db, req.into()).await?;

    let user_id = registration.user.id;
    with_new_session(
        state,
        user_id,
        SessionPayload {
            user: registration.user,
            team: Some(registration.team),
            role: Some(registration.role),
        },
    )
    .await
}

/// Sign in
///
/// # Endpoint
///
/// ```text
/// POST /auth?action=login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "secret123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: invalid username or password
async fn login(state: &AppState, req: LoginRequest) -> ApiResult<Response> {
    validate(&req)?;

    let outcome = registration::login(&state.db, &req.username, &req.password).await?;

    let user_id = outcome.user.id;
    with_new_session(
        state,
        user_id,
        SessionPayload {
            user: outcome.user,
            team: outcome.team,
            role: outcome.role,
        },
    )
    .await
}

/// Ends the session behind the cookie and expires the cookie
async fn logout(state: &AppState, headers: &HeaderMap) -> ApiResult<Response> {
    let user = authenticate(state, headers)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    if let Some(token) = session_token(headers) {
        end_session(&state.db, &token).await?;
    }

    tracing::info!(user_id = %user.id, "User logged out");

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        message("Logged out"),
    )
        .into_response())
}

/// Session check
///
/// # Response
///
/// ```json
/// { "success": true, "logged_in": true, "user": {...}, "team": {...}, "role": "member" }
/// ```
///
/// or `{ "success": true, "logged_in": false }` without a live session.
async fn check(state: &AppState, headers: &HeaderMap) -> ApiResult<Response> {
    let Some(user) = authenticate(state, headers).await? else {
        return Ok(success(CheckPayload {
            logged_in: false,
            session: None,
        })
        .into_response());
    };

    let outcome = registration::current_user(&state.db, &RequestContext::for_user(&user)).await?;

    Ok(success(CheckPayload {
        logged_in: true,
        session: Some(SessionPayload {
            user: outcome.user,
            team: outcome.team,
            role: outcome.role,
        }),
    })
    .into_response())
}

/// `POST /auth?action=register|login|logout`
pub async fn post_action(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActionQuery>,
    headers: HeaderMap,
    body: OptionalJson<serde_json::Value>,
) -> ApiResult<Response> {
    let body = body.into_inner().unwrap_or_default();

    match query.action() {
        Some("register") => register(&state, parse_body(body)?).await,
        Some("login") => login(&state, parse_body(body)?).await,
        Some("logout") => logout(&state, &headers).await,
        other => Err(unknown_action(other)),
    }
}

/// `GET /auth?action=check|logout`
pub async fn get_action(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActionQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    match query.action() {
        Some("check") => check(&state, &headers).await,
        Some("logout") => logout(&state, &headers).await,
        other => Err(unknown_action(other)),
    }
}

/// Update the signed-in user's profile
///
/// # Endpoint
///
/// ```text
/// PUT /auth?action=profile
/// Content-Type: application/json
///
/// { "nickname": "Ali", "current_password": "secret123", "new_password": "n3w-secret" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or current password missing
/// - `401 Unauthorized`: no session, or current password wrong
pub async fn put_action(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ActionQuery>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> ApiResult<Response> {
    if query.action() != Some("profile") {
        return Err(unknown_action(query.action()));
    }

    let user = authenticate(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    validate(&req)?;

    let user = registration::update_profile(
        &state.db,
        &RequestContext::for_user(&user),
        ProfileUpdate {
            nickname: req.nickname,
            current_password: req.current_password,
            new_password: req.new_password,
        },
    )
    .await?;

    Ok(success(ProfilePayload { user }).into_response())
}

/// Bodies are parsed after dispatch since each action has its own shape
fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}
