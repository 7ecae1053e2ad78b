mod bot;
mod cli;
mod config;
mod dispatch;
mod error;
mod handlers;
mod platform;
mod server;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::RunConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tgbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = RunConfig::from_env(&cli.global).context("Invalid configuration")?;

            info!("Configuration loaded successfully");
            info!("  Mode: {}", config.mode);
            if let Some(url) = &config.webhook_url {
                info!("  Webhook: {} (bind {})", url, config.bind_addr());
            }
            info!("  Admin: {:?}", config.admin_id);

            server::serve(config).await?;
        }
    }

    Ok(())
}
