//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Wallet activity feeds (Helius, Solana RPC)
//! - Token price sources (DexScreener, Jupiter)
//! - Notification channels (Telegram, log)

pub mod feed;
pub mod price;
pub mod notifier;
pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use feed::{ActivityEntry, ActivityFeed, Operation, PageRequest};
pub use price::{PriceQuote, PriceSource};
pub use notifier::{MessageFormat, Notifier};
pub use models::{FetchError, NotifyError};
