//! Market Data Adapters
//!
//! Price sources for tracked tokens:
//! - `DexScreenerClient`: most liquid pool price from DexScreener
//! - `JupiterPriceClient`: Jupiter price API

mod dexscreener;
mod jupiter_price;

pub use dexscreener::{
    parse_token_pairs, DexScreenerClient, DexScreenerConfig, DEFAULT_CHAIN_ID, DEFAULT_DEXSCREENER_API,
};
pub use jupiter_price::{
    parse_price_response, JupiterPriceClient, JupiterPriceConfig, DEFAULT_JUPITER_PRICE_API,
};
