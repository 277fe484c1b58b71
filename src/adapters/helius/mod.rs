//! Helius Adapter
//!
//! Wallet activity feed backed by the Helius enhanced transactions API.

mod client;

pub use client::{parse_transactions, HeliusClient, HeliusConfig, DEFAULT_HELIUS_API_URL};
