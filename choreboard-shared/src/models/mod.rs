/// Database models for Choreboard
///
/// Each model owns its table's queries. Query functions take any
/// `SqliteExecutor`, so the same call works against the pool or inside an
/// open transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: accounts and the current-team pointer
/// - `session`: server-side login sessions
/// - `team`: teams and their invite codes
/// - `membership`: user-team links with a per-team role
/// - `category`: per-team task categories
/// - `task`: household tasks
/// - `task_history`: append-only audit trail
/// - `notification`: per-user notifications
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::models::user::{User, CreateUser};
/// use choreboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     nickname: "Alice".to_string(),
/// }).await?;
///
/// let mut tx = pool.begin().await?;
/// let same = User::find_by_id(&mut *tx, user.id).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod membership;
pub mod notification;
pub mod session;
pub mod task;
pub mod task_history;
pub mod team;
pub mod user;
