use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Telegram bot with clap + teloxide
#[derive(Debug, Parser)]
#[command(
    name = "tgbot",
    version,
    long_about = "A functional Telegram bot starter with root command, settings, and message handlers.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the Telegram bot
    Serve,
}

/// Flags shared by every subcommand. Unset flags fall back to the
/// environment, then the config file, then built-in defaults.
#[derive(Debug, Default, Clone, Args)]
pub struct GlobalArgs {
    /// Telegram Bot API token (or set TELEGRAM_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Run mode: polling|webhook (or set BOT_MODE)
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Public HTTPS URL for webhook (or set WEBHOOK_URL)
    #[arg(long, global = true)]
    pub webhook_url: Option<String>,

    /// Webhook bind host (or set WEBHOOK_HOST)
    #[arg(long, global = true)]
    pub webhook_host: Option<String>,

    /// Webhook bind port (or set WEBHOOK_PORT)
    #[arg(long, global = true)]
    pub webhook_port: Option<u16>,

    /// Admin user ID, optional (or set ADMIN_ID)
    #[arg(long, global = true)]
    pub admin_id: Option<i64>,

    /// Optional TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}
