/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: SQLite URL (default: sqlite://choreboard.db?mode=rwc)
/// - `REMINDER_LOOKAHEAD_HOURS`: How far ahead a due date counts as "soon"
///   (default: 24, clamped to 1..=720)

use chrono::Duration;
use std::env;
use thiserror::Error;

/// Default look-ahead window (24 hours)
pub const DEFAULT_LOOK_AHEAD_HOURS: i64 = 24;

/// Minimum look-ahead window (1 hour)
pub const MIN_LOOK_AHEAD_HOURS: i64 = 1;

/// Maximum look-ahead window (30 days)
pub const MAX_LOOK_AHEAD_HOURS: i64 = 720;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number of hours, got {value:?}")]
    InvalidHours { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,

    /// Always within `MIN_LOOK_AHEAD_HOURS..=MAX_LOOK_AHEAD_HOURS`
    pub look_ahead_hours: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            database_url: "sqlite://choreboard.db?mode=rwc".to_string(),
            look_ahead_hours: DEFAULT_LOOK_AHEAD_HOURS,
        }
    }
}

impl WorkerConfig {
    /// Loads configuration from the environment (and `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let look_ahead_hours = match env::var("REMINDER_LOOKAHEAD_HOURS") {
            Ok(value) => parse_hours("REMINDER_LOOKAHEAD_HOURS", &value)?,
            Err(_) => defaults.look_ahead_hours,
        };

        Ok(WorkerConfig {
            database_url,
            look_ahead_hours,
        })
    }

    pub fn look_ahead(&self) -> Duration {
        Duration::hours(clamp_hours(self.look_ahead_hours))
    }
}

fn parse_hours(name: &'static str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map(clamp_hours)
        .map_err(|_| ConfigError::InvalidHours {
            name,
            value: value.to_string(),
        })
}

/// Non-positive values become the minimum
fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(MIN_LOOK_AHEAD_HOURS, MAX_LOOK_AHEAD_HOURS)
}
