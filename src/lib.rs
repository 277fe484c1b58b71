//! Mint Watcher Library
//!
//! Watches one Solana wallet for newly created token mints and sends a
//! one-shot alert when a token falls a configured percentage below the
//! highest price seen since discovery.
//!
//! # Modules
//!
//! - `domain`: Core logic (TrackedToken, TokenRegistry, MintDetector)
//! - `ports`: Trait abstractions (ActivityFeed, PriceSource, Notifier)
//! - `adapters`: External implementations (Helius, Solana RPC, DexScreener, Jupiter, Telegram, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Discovery and price loops, scheduler

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
