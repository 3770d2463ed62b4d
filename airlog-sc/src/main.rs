//! airlog-sc - Radio listener statistics collector
//!
//! Samples the configured stream endpoints once, enriches the sample with
//! show, track, genre, holiday, weather and daylight data, and appends one
//! row to the analytics database. Run it from a systemd timer or cron
//! every few minutes; each invocation is a complete, independent cycle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airlog_sc::{Collector, CollectorConfig};

/// Command-line arguments for airlog-sc
#[derive(Parser, Debug)]
#[command(name = "airlog-sc")]
#[command(about = "Radio listener statistics collector for AIRLOG")]
#[command(version)]
struct Args {
    /// Path to the collector configuration file
    #[arg(short, long, default_value = "airlog.toml", env = "AIRLOG_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airlog_sc=info,airlog_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting airlog-sc (statistics collector)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = CollectorConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());

    let pool = airlog_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let mut collector = Collector::new(config, pool).context("Failed to build collector")?;
    collector.run_cycle().await.context("Collection cycle failed")?;

    info!("Statistics collection completed successfully");

    Ok(())
}
