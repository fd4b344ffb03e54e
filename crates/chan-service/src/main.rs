//! Channel administration tool
//!
//! Run with:
//! ```bash
//! cargo run -p chan-service --bin chan-admin -- migrate
//! cargo run -p chan-service --bin chan-admin -- verify
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::{bail, Context};
use chan_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use chan_db::{create_pool, run_migrations, DatabaseConfig};
use chan_service::{ChannelFacade, ServiceContext};
use tracing::{error, info};

const USAGE: &str = "usage: chan-admin <migrate|verify>";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "chan-admin failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let command = std::env::args().nth(1).unwrap_or_default();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    match command.as_str() {
        "migrate" => migrate(&config).await,
        "verify" => verify(&config).await,
        _ => bail!("{USAGE}"),
    }
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool, &config.database.migrations_dir)
        .await
        .context("failed to apply migrations")?;

    info!(dir = %config.database.migrations_dir, "Migrations applied");
    Ok(())
}

async fn verify(config: &AppConfig) -> anyhow::Result<()> {
    let ctx = ServiceContext::from_config(config).await?;
    let violations = ChannelFacade::new(ctx).verify_forest().await?;

    if violations.is_empty() {
        info!("Channel forest is consistent");
        return Ok(());
    }
    for violation in &violations {
        println!("{violation}");
    }
    bail!("{} forest violation(s) found", violations.len())
}
