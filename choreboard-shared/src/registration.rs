/// Registration, login and profile updates
///
/// Registration comes in two modes:
///
/// - **create**: the new user founds a team and becomes its admin
/// - **join**: the new user enters an invite code and becomes a member
///
/// Either way the whole thing is one transaction: a user never exists without
/// a team, and a failed registration leaves no rows behind. All input is
/// validated before the transaction starts.
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::registration::{register, RegisterInput, RegistrationMode};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let registered = register(&pool, RegisterInput {
///     username: "alice".to_string(),
///     password: "hunter22".to_string(),
///     nickname: Some("Alice".to_string()),
///     mode: RegistrationMode::Create { team_name: "Flat 4B".to_string() },
/// }).await?;
///
/// println!("invite code: {}", registered.team.invite_code);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::context::RequestContext;
use crate::auth::password::{hash_password, validate_password_policy, verify_password};
use crate::directory::invite_code::{generate_invite_code, normalize_invite_code};
use crate::directory::teams::validate_team_name;
use crate::error::{ServiceError, ServiceResult};
use crate::fanout;
use crate::models::membership::{TeamMember, TeamRole};
use crate::models::team::{CreateTeam, Team};
use crate::models::user::{CreateUser, User};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_NICKNAME_LENGTH: usize = 50;

const BAD_CREDENTIALS: &str = "Invalid username or password";
const USERNAME_TAKEN: &str = "Username already exists";

#[derive(Debug, Clone)]
pub enum RegistrationMode {
    /// Found a new team
    Create { team_name: String },

    /// Join an existing team
    Join { invite_code: String },
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,

    /// Display name; the username is used when empty
    pub nickname: Option<String>,

    pub mode: RegistrationMode,
}

/// A freshly registered user and the team they landed in
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub user: User,
    pub team: Team,
    pub role: TeamRole,
}

/// Signed-in user with their current team, if any
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: User,
    pub team: Option<Team>,
    pub role: Option<TeamRole>,
}

/// Profile changes; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,

    /// Required when `new_password` is set
    pub current_password: Option<String>,

    pub new_password: Option<String>,
}

/// Trims a username and checks its length
pub fn validate_username(username: &str) -> ServiceResult<String> {
    let username = username.trim();
    let len = username.chars().count();

    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(ServiceError::validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }

    Ok(username.to_string())
}

fn resolve_nickname(nickname: Option<&str>, username: &str) -> ServiceResult<String> {
    let nickname = nickname.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(username);

    if nickname.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(ServiceError::validation(format!(
            "Nickname must be at most {} characters",
            MAX_NICKNAME_LENGTH
        )));
    }

    Ok(nickname.to_string())
}

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ServiceError::Internal("Password could not be processed".to_string())
    })
}

/// Registers a user in create or join mode
///
/// # Errors
///
/// - `Validation`: bad username, password, team name or empty invite code
/// - `Conflict`: username taken
/// - `NotFound`: invite code doesn't match a team (nothing is written)
pub async fn register(pool: &SqlitePool, input: RegisterInput) -> ServiceResult<Registration> {
    let username = validate_username(&input.username)?;
    validate_password_policy(&input.password).map_err(ServiceError::Validation)?;
    let nickname = resolve_nickname(input.nickname.as_deref(), &username)?;

    let mode = match input.mode {
        RegistrationMode::Create { team_name } => RegistrationMode::Create {
            team_name: validate_team_name(&team_name)?,
        },
        RegistrationMode::Join { invite_code } => {
            let invite_code = normalize_invite_code(&invite_code);
            if invite_code.is_empty() {
                return Err(ServiceError::validation("Invite code is required"));
            }
            RegistrationMode::Join { invite_code }
        }
    };

    if User::username_exists(pool, &username).await? {
        return Err(ServiceError::Conflict(USERNAME_TAKEN.to_string()));
    }

    let password_hash = hash(&input.password)?;

    let mut tx = pool.begin().await?;

    // join mode resolves the code before anything is written
    let joined_team = match &mode {
        RegistrationMode::Join { invite_code } => Some(
            Team::find_by_invite_code(&mut *tx, invite_code)
                .await?
                .ok_or_else(|| ServiceError::not_found("Invalid invite code"))?,
        ),
        RegistrationMode::Create { .. } => None,
    };

    let user = User::create(
        &mut *tx,
        CreateUser {
            username,
            password_hash,
            nickname,
        },
    )
    .await
    .map_err(|e| ServiceError::conflict_on_unique(e, USERNAME_TAKEN))?;

    let (team, role) = match (mode, joined_team) {
        (RegistrationMode::Create { team_name }, _) => {
            let invite_code = generate_invite_code(&mut tx).await?;
            let team = Team::create(
                &mut *tx,
                CreateTeam {
                    name: team_name,
                    invite_code,
                    created_by: user.id,
                },
            )
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Invite code collision, please retry"))?;
            (team, TeamRole::Admin)
        }
        (RegistrationMode::Join { .. }, Some(team)) => (team, TeamRole::Member),
        (RegistrationMode::Join { .. }, None) => {
            return Err(ServiceError::not_found("Invalid invite code"));
        }
    };

    TeamMember::create(&mut *tx, team.id, user.id, role).await?;
    User::set_current_team(&mut *tx, user.id, Some(team.id)).await?;

    if role == TeamRole::Member {
        let _ = fanout::on_member_joined(&mut tx, &team, user.id).await;
    }

    let user = User::find_by_id(&mut *tx, user.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        team_id = %team.id,
        role = role.as_str(),
        "User registered"
    );

    Ok(Registration { user, team, role })
}

/// Checks credentials
///
/// Unknown usernames and wrong passwords get the same error. Team state is
/// read, never changed.
pub async fn login(pool: &SqlitePool, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
    let user = User::find_by_username(pool, username.trim())
        .await?
        .ok_or_else(|| ServiceError::Authentication(BAD_CREDENTIALS.to_string()))?;

    let valid = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
        tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unusable");
        false
    });
    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(ServiceError::Authentication(BAD_CREDENTIALS.to_string()));
    }

    let (team, role) = match user.current_team_id {
        Some(team_id) => (
            Team::find_by_id(pool, team_id).await?,
            TeamMember::get_role(pool, team_id, user.id).await?,
        ),
        None => (None, None),
    };

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(LoginOutcome { user, team, role })
}

/// Current user with their current team and role
pub async fn current_user(pool: &SqlitePool, ctx: &RequestContext) -> ServiceResult<LoginOutcome> {
    let user = User::find_by_id(pool, ctx.user_id)
        .await?
        .ok_or_else(|| ServiceError::Authentication("Not logged in".to_string()))?;

    let (team, role) = match user.current_team_id {
        Some(team_id) => (
            Team::find_by_id(pool, team_id).await?,
            TeamMember::get_role(pool, team_id, user.id).await?,
        ),
        None => (None, None),
    };

    Ok(LoginOutcome { user, team, role })
}

/// Changes nickname and/or password
///
/// A password change requires the current password.
pub async fn update_profile(
    pool: &SqlitePool,
    ctx: &RequestContext,
    update: ProfileUpdate,
) -> ServiceResult<User> {
    let user = User::find_by_id(pool, ctx.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    let nickname = update
        .nickname
        .as_deref()
        .map(|n| resolve_nickname(Some(n), &user.username))
        .transpose()?;

    let password_hash = match update.new_password.as_deref() {
        Some(new_password) => {
            validate_password_policy(new_password).map_err(ServiceError::Validation)?;

            let current = update
                .current_password
                .as_deref()
                .ok_or_else(|| ServiceError::validation("Current password is required"))?;
            if !verify_password(current, &user.password_hash).unwrap_or(false) {
                return Err(ServiceError::Authentication(
                    "Current password is incorrect".to_string(),
                ));
            }

            Some(hash(new_password)?)
        }
        None => None,
    };

    let mut tx = pool.begin().await?;

    if let Some(nickname) = &nickname {
        User::update_nickname(&mut *tx, user.id, nickname).await?;
    }
    if let Some(password_hash) = &password_hash {
        User::update_password_hash(&mut *tx, user.id, password_hash).await?;
    }

    let user = User::find_by_id(&mut *tx, user.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        nickname_changed = nickname.is_some(),
        password_changed = password_hash.is_some(),
        "Profile updated"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  bob ").unwrap(), "bob");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_nickname_defaults_to_username() {
        assert_eq!(resolve_nickname(None, "bob").unwrap(), "bob");
        assert_eq!(resolve_nickname(Some("   "), "bob").unwrap(), "bob");
        assert_eq!(resolve_nickname(Some(" Bobby "), "bob").unwrap(), "Bobby");
        assert!(resolve_nickname(Some(&"n".repeat(51)), "bob").is_err());
    }
}
