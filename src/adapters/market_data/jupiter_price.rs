use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::http::{build_client, decode_json, fetch_json, DEFAULT_REQUEST_TIMEOUT};
use crate::ports::{FetchError, PriceQuote, PriceSource};

pub const DEFAULT_JUPITER_PRICE_API: &str = "https://api.jup.ag/price/v2";

/// Jupiter price API client configuration
#[derive(Debug, Clone)]
pub struct JupiterPriceConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for JupiterPriceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_JUPITER_PRICE_API.to_string(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JupiterPriceClient {
    config: JupiterPriceConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<PriceData>>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    /// v2 returns the price as a string, v6 as a number
    #[serde(default)]
    price: Value,
}

fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Extract the USD price of `mint` from a price response body
///
/// A mint missing from `data`, or mapped to `null`, is "no data".
pub fn parse_price_response(body: &str, mint: &str) -> Result<Option<PriceQuote>, FetchError> {
    let response: PriceResponse = decode_json(body)?;
    Ok(quote_for(response, mint))
}

fn quote_for(mut response: PriceResponse, mint: &str) -> Option<PriceQuote> {
    let data = response.data.remove(mint).flatten()?;
    price_value(&data.price).map(PriceQuote::new)
}

impl JupiterPriceClient {
    pub fn new(config: JupiterPriceConfig) -> Result<Self, FetchError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl PriceSource for JupiterPriceClient {
    fn name(&self) -> &str {
        "jupiter"
    }

    async fn fetch_price(&self, mint: &str) -> Result<Option<PriceQuote>, FetchError> {
        let mut request = self.http.get(&self.config.api_url).query(&[("ids", mint)]);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response: PriceResponse = fetch_json(request, self.config.timeout).await?;
        Ok(quote_for(response, mint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINT: &str = "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN";

    #[test]
    fn test_client_creation() {
        let client = JupiterPriceClient::new(JupiterPriceConfig::default()).unwrap();
        assert_eq!(client.name(), "jupiter");
    }

    #[test]
    fn test_parse_v2_string_price() {
        let body = format!(
            r#"{{"data": {{"{}": {{"id": "{}", "type": "derivedPrice", "price": "0.8412345"}}}}, "timeTaken": 0.003}}"#,
            MINT, MINT
        );
        let quote = parse_price_response(&body, MINT).unwrap().unwrap();
        assert_relative_eq!(quote.price_usd, 0.8412345);
        assert_eq!(quote.liquidity_usd, None);
    }

    #[test]
    fn test_parse_v6_numeric_price() {
        let body = format!(r#"{{"data": {{"{}": {{"price": 1.25, "mintSymbol": "JUP"}}}}}}"#, MINT);
        let quote = parse_price_response(&body, MINT).unwrap().unwrap();
        assert_relative_eq!(quote.price_usd, 1.25);
    }

    #[test]
    fn test_unknown_mint_is_no_data() {
        let null_entry = format!(r#"{{"data": {{"{}": null}}}}"#, MINT);
        assert!(parse_price_response(&null_entry, MINT).unwrap().is_none());
        assert!(parse_price_response(r#"{"data": {}}"#, MINT).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_price_is_no_data() {
        let body = format!(r#"{{"data": {{"{}": {{"price": "n/a"}}}}}}"#, MINT);
        assert!(parse_price_response(&body, MINT).unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(parse_price_response("rate limited", MINT).unwrap_err().is_malformed());
    }
}
