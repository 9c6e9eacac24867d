use std::sync::Arc;
use std::time::Duration;

use osswatch_core::Config;
use osswatch_db::PgProjectStore;
use osswatch_scanner::{HipcheckCli, ScanRunner};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await?;

    let store = Arc::new(PgProjectStore::new(pool));
    let tool = Arc::new(HipcheckCli::new(
        config.scan_tool_path.clone(),
        Duration::from_secs(config.scan_timeout_seconds),
    ));

    let runner = ScanRunner::new(store, tool);
    let summary = runner.run_batch().await?;

    tracing::info!(
        scanned = summary.scanned,
        updated = summary.updated,
        failed = summary.failed,
        "Scanner run complete"
    );
    Ok(())
}
