//! Geocode providers stored without coordinates.
//!
//! Re-runs the address resolver for providers whose lookup failed (or that
//! predate geocoding) and stores every coordinate pair it finds.

use anyhow::{Context, Result};
use clap::Parser;
use dispatch_core::config::Config;
use dispatch_core::domains::providers::activities::backfill_coordinates;
use dispatch_core::kernel::ServerDeps;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "backfill_coordinates")]
#[command(about = "Geocode providers that have an address but no coordinates")]
struct Cli {
    /// Maximum number of providers to process
    #[arg(long, default_value_t = 100)]
    limit: i64,

    /// Resolve but do not write anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dispatch_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let deps = ServerDeps::from_config(pool, &config.geocoder)?;
    let report = backfill_coordinates(cli.limit.max(1), cli.dry_run, &deps).await?;

    println!(
        "scanned={} resolved={} unresolved={}{}",
        report.scanned,
        report.resolved,
        report.unresolved,
        if cli.dry_run { " (dry run)" } else { "" }
    );

    Ok(())
}
