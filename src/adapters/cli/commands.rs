//! CLI Command Definitions
//!
//! Argument structures for every subcommand; handlers live in the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/watcher.toml";

/// Mint Watcher - new-token discovery and drawdown alerts for a Solana wallet
#[derive(Parser, Debug)]
#[command(
    name = "mint-watcher",
    version = env!("CARGO_PKG_VERSION"),
    about = "Watches a Solana wallet for new token mints and alerts on drawdowns",
    long_about = "Mint Watcher polls a wallet's transaction history for mint-creation \
                  instructions, tracks each new token's all-time high and sends a one-shot \
                  Telegram alert when the price falls a configured percentage below it."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start watching the configured wallet
    Run(RunCmd),

    /// Print the chat id of incoming Telegram messages
    ChatId(ChatIdCmd),

    /// Load and validate the configuration file
    CheckConfig(CheckConfigCmd),
}

/// Start the watcher
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log notifications instead of sending them to Telegram
    #[arg(long)]
    pub dry_run: bool,
}

/// Look up Telegram chat ids
#[derive(Parser, Debug)]
pub struct ChatIdCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Stop listening after this many seconds (0 = until Ctrl+C)
    #[arg(short, long, value_name = "SECS", default_value = "0")]
    pub timeout: u64,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Skip the Telegram credential checks
    #[arg(long)]
    pub dry_run: bool,
}
