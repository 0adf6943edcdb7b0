//! # Choreboard Worker
//!
//! Runs one due-reminder sweep and exits. Schedule it externally, e.g.
//!
//! ```bash
//! */30 * * * * DATABASE_URL=sqlite:///var/lib/choreboard.db choreboard-worker
//! ```

use choreboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use choreboard_worker::{config::WorkerConfig, sweeper::ReminderSweeper};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "choreboard_worker=info,choreboard_shared=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "Choreboard Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let result = ReminderSweeper::from_config(pool.clone(), &config)
        .run_once()
        .await;

    close_pool(pool).await;
    result?;

    Ok(())
}
