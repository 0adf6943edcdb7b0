/// Session cookie handling
///
/// The browser holds an opaque token in the `choreboard_session` cookie; the
/// server stores only its SHA-256. [`require_session`] resolves the cookie
/// on every protected route and inserts a [`RequestContext`] and the
/// [`CurrentUser`] into request extensions. The current team is read fresh
/// from the user row, so a switch takes effect on the next request.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use choreboard_shared::{
    auth::{context::RequestContext, session::resolve_session},
    models::user::User,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

pub const SESSION_COOKIE_NAME: &str = "choreboard_session";

const NOT_LOGGED_IN: &str = "Not logged in";

/// The authenticated user, as loaded at the start of the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE_NAME,
        token,
        max_age_seconds,
        if secure { "; Secure" } else { "" }
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("choreboard_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Session token from the `Cookie` header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE_NAME);

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolves the cookie to a live session's user, `None` if there isn't one
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<User>> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };

    Ok(resolve_session(&state.db, &token).await?)
}

/// Rejects requests without a live session with 401
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, req.headers())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(NOT_LOGGED_IN.to_string()))?;

    req.extensions_mut().insert(RequestContext::for_user(&user));
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
