/// Invite code generation
///
/// Codes are six characters drawn from uppercase letters and digits with the
/// easily confused `0`, `O`, `I` and `1` removed, leaving 32 symbols:
///
/// ```text
/// ABCDEFGHJKLMNPQRSTUVWXYZ23456789
/// ```
///
/// Generation tries up to ten random codes, each checked against existing
/// teams. If every attempt collides, a hash-derived code is returned instead.
/// The UNIQUE index on `teams.invite_code` remains the real guarantee; the
/// check here only keeps conflicts rare.
///
/// # Example
///
/// ```
/// use choreboard_shared::directory::invite_code::{is_valid_invite_code, random_invite_code};
///
/// let code = random_invite_code();
/// assert_eq!(code.len(), 6);
/// assert!(is_valid_invite_code(&code));
/// ```

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::team::Team;

pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const INVITE_CODE_LENGTH: usize = 6;

/// Random attempts before falling back to the hash-derived code
pub const MAX_ATTEMPTS: usize = 10;

pub fn random_invite_code() -> String {
    let mut rng = rand::thread_rng();

    (0..INVITE_CODE_LENGTH)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Code derived from SHA-256 over a fresh UUID and the current time
pub fn fallback_invite_code() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(INVITE_CODE_LENGTH)
        .map(|byte| INVITE_CODE_ALPHABET[*byte as usize % INVITE_CODE_ALPHABET.len()] as char)
        .collect()
}

/// Trims and uppercases user input
pub fn normalize_invite_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

pub fn is_valid_invite_code(code: &str) -> bool {
    code.len() == INVITE_CODE_LENGTH && code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b))
}

/// Generates a code not held by any team, checked on `conn`
///
/// Pass the open transaction the team insert will run on, so the check and
/// the insert see the same state.
pub async fn generate_invite_code(conn: &mut SqliteConnection) -> Result<String, sqlx::Error> {
    for attempt in 1..=MAX_ATTEMPTS {
        let code = random_invite_code();
        if !Team::invite_code_exists(&mut *conn, &code).await? {
            return Ok(code);
        }
        tracing::debug!(attempt, "Invite code collision, retrying");
    }

    tracing::warn!(
        attempts = MAX_ATTEMPTS,
        "Invite code attempts exhausted, using hash-derived code"
    );
    Ok(fallback_invite_code())
}
