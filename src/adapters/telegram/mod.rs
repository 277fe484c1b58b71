//! Telegram Adapter
//!
//! Bot API notifier (`sendMessage`) plus the `getUpdates` polling used to
//! look up a chat id.

mod client;
pub mod types;

pub use client::{TelegramConfig, TelegramNotifier, DEFAULT_TELEGRAM_API_URL};
pub use types::{Chat, Message, Update};
