//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Helius: enhanced transactions feed
//! - Solana: JSON-RPC feed and parsed-instruction decoding
//! - Market Data: DexScreener and Jupiter price sources
//! - Telegram: Bot API notifier
//! - CLI: Command-line interface definitions

pub mod http;
pub mod helius;
pub mod solana;
pub mod market_data;
pub mod telegram;
pub mod log_notifier;
pub mod cli;

pub use helius::HeliusClient;
pub use solana::SolanaClient;
pub use market_data::{DexScreenerClient, JupiterPriceClient};
pub use telegram::TelegramNotifier;
pub use log_notifier::LogNotifier;
pub use cli::CliApp;
