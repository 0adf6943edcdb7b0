/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`session`]: opaque session tokens, stored as SHA-256 hashes
/// - [`context`]: the per-request `{user_id, current_team_id}` pair
/// - [`authorization`]: team membership and admin checks
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::auth::password::{hash_password, verify_password};
/// use choreboard_shared::auth::session::generate_session_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let (cookie_value, stored_hash) = generate_session_token();
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod context;
pub mod password;
pub mod session;
