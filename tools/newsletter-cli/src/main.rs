//! Newsletter data pipeline
//!
//! Loads settings, installs logging and runs one subcommand to completion.

use anyhow::{Context, Result};
use clap::Parser;
use newsletter_cli::{initialize_logging, Cli, CliHandler, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config).context("Failed to load configuration")?;
    initialize_logging(&settings.logging.level, &settings.logging.format)?;

    info!("Starting newsletter v{}", env!("CARGO_PKG_VERSION"));

    CliHandler::new(settings).handle_command(cli.command).await
}
