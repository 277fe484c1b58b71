//! DexScreener Price Source
//!
//! `GET /latest/dex/tokens/{mint}` lists every pool trading the token across
//! chains. The most liquid pool on the configured chain with the token as
//! base supplies the USD price.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::adapters::http::{build_client, decode_json, fetch_json, DEFAULT_REQUEST_TIMEOUT};
use crate::ports::{FetchError, PriceQuote, PriceSource};

pub const DEFAULT_DEXSCREENER_API: &str = "https://api.dexscreener.com";
pub const DEFAULT_CHAIN_ID: &str = "solana";

#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    pub api_url: String,
    pub chain_id: String,
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DEXSCREENER_API.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    /// `null` when the token has no pools yet
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    chain_id: String,
    base_token: PairToken,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
}

#[derive(Debug, Deserialize)]
struct PairToken {
    address: String,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    #[serde(default)]
    usd: Option<f64>,
}

impl Pair {
    fn liquidity_usd(&self) -> Option<f64> {
        self.liquidity.as_ref().and_then(|l| l.usd)
    }

    fn quote(&self) -> Option<PriceQuote> {
        let price: f64 = self.price_usd.as_deref()?.parse().ok()?;
        let quote = PriceQuote::new(price);
        Some(match self.liquidity_usd() {
            Some(liq) => quote.with_liquidity(liq),
            None => quote,
        })
    }
}

fn best_quote(response: TokenPairsResponse, mint: &str, chain_id: &str) -> Option<PriceQuote> {
    response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .filter(|p| p.chain_id == chain_id && p.base_token.address == mint)
        .filter_map(|p| p.quote())
        .max_by(|a, b| {
            let a = a.liquidity_usd.unwrap_or(0.0);
            let b = b.liquidity_usd.unwrap_or(0.0);
            a.total_cmp(&b)
        })
}

/// Pick the most liquid pair's price from a token-pairs response body
pub fn parse_token_pairs(body: &str, mint: &str, chain_id: &str) -> Result<Option<PriceQuote>, FetchError> {
    let response: TokenPairsResponse = decode_json(body)?;
    Ok(best_quote(response, mint, chain_id))
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> Result<Self, FetchError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    fn token_url(&self, mint: &str) -> String {
        format!(
            "{}/latest/dex/tokens/{}",
            self.config.api_url.trim_end_matches('/'),
            mint
        )
    }
}

#[async_trait]
impl PriceSource for DexScreenerClient {
    fn name(&self) -> &str {
        "dexscreener"
    }

    async fn fetch_price(&self, mint: &str) -> Result<Option<PriceQuote>, FetchError> {
        let request = self.http.get(self.token_url(mint));
        let response: TokenPairsResponse = fetch_json(request, self.config.timeout).await?;
        Ok(best_quote(response, mint, &self.config.chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINT: &str = "MintAbc111";

    fn pair(chain: &str, base: &str, price: &str, liquidity: f64) -> String {
        format!(
            r#"{{
                "chainId": "{}",
                "dexId": "raydium",
                "url": "https://dexscreener.com/{}/pool",
                "pairAddress": "Pool{}",
                "baseToken": {{ "address": "{}", "name": "Fresh", "symbol": "FRSH" }},
                "quoteToken": {{ "address": "So11111111111111111111111111111111111111112", "name": "Wrapped SOL", "symbol": "SOL" }},
                "priceNative": "0.0000001",
                "priceUsd": "{}",
                "liquidity": {{ "usd": {}, "base": 1000, "quote": 10 }}
            }}"#,
            chain, chain, liquidity, base, price, liquidity
        )
    }

    fn body(pairs: &[String]) -> String {
        format!(r#"{{"schemaVersion": "1.0.0", "pairs": [{}]}}"#, pairs.join(","))
    }

    #[test]
    fn test_most_liquid_pair_wins() {
        let body = body(&[
            pair("solana", MINT, "0.0012", 5_000.0),
            pair("solana", MINT, "0.0015", 80_000.0),
            pair("solana", MINT, "0.0011", 20_000.0),
        ]);
        let quote = parse_token_pairs(&body, MINT, "solana").unwrap().unwrap();
        assert_relative_eq!(quote.price_usd, 0.0015);
        assert_eq!(quote.liquidity_usd, Some(80_000.0));
    }

    #[test]
    fn test_other_chains_and_quote_side_ignored() {
        let body = body(&[
            pair("ethereum", MINT, "9.0", 1_000_000.0),
            pair("solana", "OtherBase", "7.0", 500_000.0),
            pair("solana", MINT, "0.5", 100.0),
        ]);
        let quote = parse_token_pairs(&body, MINT, "solana").unwrap().unwrap();
        assert_relative_eq!(quote.price_usd, 0.5);
    }

    #[test]
    fn test_null_pairs_is_no_data() {
        let body = r#"{"schemaVersion": "1.0.0", "pairs": null}"#;
        assert!(parse_token_pairs(body, MINT, "solana").unwrap().is_none());
    }

    #[test]
    fn test_missing_price_is_no_data() {
        let body = r#"{"pairs": [{"chainId": "solana", "baseToken": {"address": "MintAbc111"}}]}"#;
        assert!(parse_token_pairs(body, MINT, "solana").unwrap().is_none());
    }

    #[test]
    fn test_html_error_page_is_malformed() {
        let err = parse_token_pairs("<html>502</html>", MINT, "solana").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_token_url() {
        let client = DexScreenerClient::new(DexScreenerConfig::default()).unwrap();
        assert_eq!(client.name(), "dexscreener");
        assert_eq!(
            client.token_url(MINT),
            "https://api.dexscreener.com/latest/dex/tokens/MintAbc111"
        );
    }
}
