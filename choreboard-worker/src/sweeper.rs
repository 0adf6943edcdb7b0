/// Due-reminder sweeper
///
/// One pass over open, assigned tasks; each one due inside the look-ahead
/// window gets a `due_reminder` notification for its assignee. Nothing is
/// deduplicated, so every run reminds again.
///
/// # Example
///
/// ```no_run
/// use choreboard_worker::sweeper::ReminderSweeper;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let sweeper = ReminderSweeper::new(pool, chrono::Duration::hours(24));
/// let report = sweeper.run_once().await?;
/// println!("{} reminders sent", report.sent);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use choreboard_shared::fanout::{sweep_due_reminders, SweepReport};
use sqlx::SqlitePool;

use crate::config::WorkerConfig;

pub struct ReminderSweeper {
    db: SqlitePool,
    look_ahead: Duration,
}

impl ReminderSweeper {
    pub fn new(db: SqlitePool, look_ahead: Duration) -> Self {
        ReminderSweeper { db, look_ahead }
    }

    pub fn from_config(db: SqlitePool, config: &WorkerConfig) -> Self {
        Self::new(db, config.look_ahead())
    }

    pub fn look_ahead(&self) -> Duration {
        self.look_ahead
    }

    /// Sweeps relative to the current time
    pub async fn run_once(&self) -> Result<SweepReport, sqlx::Error> {
        self.run_at(Utc::now()).await
    }

    /// Sweeps relative to `now`
    ///
    /// # Errors
    ///
    /// Only a failed task scan is an error. Individual reminder failures are
    /// counted in the report and logged.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepReport, sqlx::Error> {
        tracing::info!(
            now = %now,
            look_ahead_hours = self.look_ahead.num_hours(),
            "Starting due-reminder sweep"
        );

        let report = sweep_due_reminders(&self.db, now, self.look_ahead).await?;

        if report.failed > 0 {
            tracing::warn!(
                due = report.due,
                sent = report.sent,
                failed = report.failed,
                "Due-reminder sweep finished with failures"
            );
        } else {
            tracing::info!(
                due = report.due,
                sent = report.sent,
                "Due-reminder sweep finished"
            );
        }

        Ok(report)
    }
}
