//! Price Source Port

use async_trait::async_trait;

use super::models::FetchError;

/// Current USD price of a token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price_usd: f64,
    pub liquidity_usd: Option<f64>,
}

impl PriceQuote {
    pub fn new(price_usd: f64) -> Self {
        Self {
            price_usd,
            liquidity_usd: None,
        }
    }

    pub fn with_liquidity(mut self, liquidity_usd: f64) -> Self {
        self.liquidity_usd = Some(liquidity_usd);
        self
    }

    /// A price the drawdown math can use: finite and not negative
    pub fn is_usable(&self) -> bool {
        self.price_usd.is_finite() && self.price_usd >= 0.0
    }
}

/// Token price provider
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Fetch the current price of `mint`
    ///
    /// `Ok(None)` means the provider has no market for the token yet.
    async fn fetch_price(&self, mint: &str) -> Result<Option<PriceQuote>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_price() {
        assert!(PriceQuote::new(0.0012).is_usable());
        assert!(PriceQuote::new(0.0).is_usable());
        assert!(!PriceQuote::new(-1.0).is_usable());
        assert!(!PriceQuote::new(f64::NAN).is_usable());
        assert!(!PriceQuote::new(f64::INFINITY).is_usable());
    }

    #[test]
    fn test_with_liquidity() {
        let quote = PriceQuote::new(1.5).with_liquidity(20_000.0);
        assert_eq!(quote.liquidity_usd, Some(20_000.0));
    }
}
