/// Configuration management for the API server
///
/// Loaded from environment variables (and a `.env` file in development).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: SQLite URL (default: sqlite://choreboard.db?mode=rwc)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SESSION_TTL_HOURS`: Session lifetime (default: 168, one week)
/// - `COOKIE_SECURE`: Mark the session cookie `Secure` (default: false)
/// - `CORS_ORIGINS`: Comma separated origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary's tracing setup
///
/// # Example
///
/// ```no_run
/// use choreboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    pub max_connections: u32,
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in hours, also the cookie's Max-Age
    pub ttl_hours: i64,

    /// Send the cookie over HTTPS only
    pub cookie_secure: bool,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "sqlite://choreboard.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            session: SessionConfig {
                ttl_hours: 168,
                cookie_secure: false,
            },
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable doesn't parse or the session
    /// TTL isn't positive.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let host = env::var("API_HOST").unwrap_or(defaults.api.host);
        let port = match env::var("API_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => defaults.api.port,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.api.cors_origins);

        let url = env::var("DATABASE_URL").unwrap_or(defaults.database.url);
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v.parse::<u32>()?,
            Err(_) => defaults.database.max_connections,
        };

        let ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(v) => v.parse::<i64>()?,
            Err(_) => defaults.session.ttl_hours,
        };
        if ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production: env_flag("PRODUCTION"),
            },
            database: DatabaseConfig {
                url,
                max_connections,
            },
            session: SessionConfig {
                ttl_hours,
                cookie_secure: env_flag("COOKIE_SECURE"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
