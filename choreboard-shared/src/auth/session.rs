/// Session token utilities
///
/// Tokens are 43 random URL-safe characters handed to the browser in the
/// session cookie. Only the SHA-256 hash reaches the database, so a leaked
/// `sessions` table can't be replayed.
///
/// # Example
///
/// ```
/// use choreboard_shared::auth::session::{generate_session_token, hash_session_token};
///
/// let (token, hash) = generate_session_token();
/// assert_eq!(token.len(), 43);
/// assert_eq!(hash, hash_session_token(&token));
/// ```

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::session::Session;
use crate::models::user::User;

/// Length of a session token (characters)
pub const SESSION_TOKEN_LENGTH: usize = 43;

/// Generates a session token and its SHA-256 hash
///
/// Returns `(plaintext_token, sha256_hex)`.
pub fn generate_session_token() -> (String, String) {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut rng = rand::thread_rng();

    let token: String = (0..SESSION_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let hash = hash_session_token(&token);

    (token, hash)
}

/// Hex-encoded SHA-256 of a token (64 characters)
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Opens a session for `user_id`, returns the plaintext token for the cookie
pub async fn start_session(
    pool: &SqlitePool,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, sqlx::Error> {
    let (token, hash) = generate_session_token();
    Session::create(pool, user_id, &hash, Utc::now() + ttl).await?;

    tracing::debug!(user_id = %user_id, "Session started");
    Ok(token)
}

/// Resolves a cookie token to its user
///
/// Unknown and expired tokens both yield `None`; expired rows are removed on
/// the way out.
pub async fn resolve_session(pool: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let hash = hash_session_token(token);

    let Some(session) = Session::find_by_token_hash(pool, &hash).await? else {
        return Ok(None);
    };

    if session.is_expired() {
        Session::delete_by_token_hash(pool, &hash).await?;
        return Ok(None);
    }

    User::find_by_id(pool, session.user_id).await
}

/// Ends the session behind `token`; a no-op for unknown tokens
pub async fn end_session(pool: &SqlitePool, token: &str) -> Result<bool, sqlx::Error> {
    Session::delete_by_token_hash(pool, &hash_session_token(token)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let (token, hash) = generate_session_token();

        assert_eq!(token.len(), SESSION_TOKEN_LENGTH);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_session_token(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_session_token();
        let (b, _) = generate_session_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_session_token("abc"), hash_session_token("abc"));
        assert_ne!(hash_session_token("abc"), hash_session_token("abd"));
    }
}
