/// Database connection pool management
///
/// This module builds the SQLite connection pool shared by the API server and
/// the reminder worker. The pool is an explicitly constructed handle that is
/// passed into every operation; nothing in the crate reaches for a global
/// connection.
///
/// # Example
///
/// ```no_run
/// use choreboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: "sqlite://choreboard.db?mode=rwc".to_string(),
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///
///     let row: (i64,) = sqlx::query_as("SELECT ?")
///         .bind(42i64)
///         .fetch_one(&pool)
///         .await?;
///
///     Ok(())
/// }
/// ```

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the database connection pool
///
/// All timeouts are specified in seconds for ease of configuration from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g., "sqlite://choreboard.db?mode=rwc")
    pub url: String,

    /// Maximum number of connections in the pool
    ///
    /// Default: 10
    pub max_connections: u32,

    /// Minimum number of idle connections to maintain
    ///
    /// Default: 1
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    ///
    /// Default: 30 seconds
    pub connect_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed (seconds)
    ///
    /// Default: Some(600) (10 minutes)
    /// None = connections never closed due to idle time
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before forced recycling (seconds)
    ///
    /// Default: Some(1800) (30 minutes)
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://choreboard.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates and initializes a SQLite connection pool
///
/// This function:
/// 1. Parses the URL and turns on foreign key enforcement
/// 2. Creates a pool with the specified configuration
/// 3. Performs a health check to verify the database answers
///
/// # Errors
///
/// Returns an error if the URL is invalid, the file cannot be opened, or the
/// health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_seconds = config.connect_timeout_seconds,
        "Creating database connection pool"
    );

    let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
        debug!(idle_timeout_seconds = idle_timeout, "Set idle timeout");
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
        debug!(max_lifetime_seconds = max_lifetime, "Set max lifetime");
    }

    let pool = pool_options.connect_with(options).await?;

    health_check(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Creates a pool over a private in-memory database
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to a single connection that is never recycled. Used by tests
/// and local experiments.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    health_check(&pool).await?;
    Ok(pool)
}

/// Performs a health check on the database connection
///
/// # Errors
///
/// Returns an error if the health check query fails
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!("Database health check returned unexpected value: {}", result.0);
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Gracefully closes the connection pool
pub async fn close_pool(pool: SqlitePool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
        assert!(config.url.starts_with("sqlite:"));
    }

    #[tokio::test]
    async fn test_memory_pool_answers_health_check() {
        let pool = create_memory_pool().await.expect("memory pool");
        health_check(&pool).await.expect("health check");
        close_pool(pool).await;
    }
}
