/// Database layer for Choreboard
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Embedded migration runner
/// - Models are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
pub mod migrations;

/// Returns true when the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
