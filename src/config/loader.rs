//! Configuration Loader
//!
//! Loads the watcher configuration from a TOML file, fills empty secrets from
//! the environment and validates the result.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::helius::DEFAULT_HELIUS_API_URL;
use crate::adapters::market_data::{DEFAULT_CHAIN_ID, DEFAULT_DEXSCREENER_API, DEFAULT_JUPITER_PRICE_API};
use crate::adapters::telegram::DEFAULT_TELEGRAM_API_URL;
use crate::application::discovery::{DiscoveryConfig, DEFAULT_MAX_PAGES_PER_CYCLE, DEFAULT_PAGE_SIZE};
use crate::application::price_monitor::{PriceMonitorConfig, DEFAULT_MAX_CONCURRENT_FETCHES};
use crate::domain::known_programs::is_valid_address;
use crate::domain::{MintPattern, DEFAULT_DRAWDOWN_THRESHOLD_PCT, DEFAULT_SEEN_CAPACITY};

/// Largest page the supported feeds accept
pub const MAX_PAGE_SIZE: usize = 100;

/// Main configuration structure matching watcher.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wallet: WalletSection,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub price: PriceSection,
    #[serde(default)]
    pub helius: HeliusSection,
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub dexscreener: DexScreenerSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Watched wallet
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSection {
    /// Base58 address; may be left empty and supplied via WALLET_ADDRESS
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryProvider {
    Helius,
    Rpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    Dexscreener,
    Jupiter,
}

/// Discovery loop configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub provider: DiscoveryProvider,
    pub poll_interval_secs: u64,
    /// Entries requested per feed page
    pub page_size: usize,
    /// Backfill limit when the wallet produced more than one page since the last cycle
    pub max_pages_per_cycle: usize,
    /// Processed signatures remembered for dedup
    pub seen_capacity: usize,
    /// Additional mint-creating instructions, e.g. launchpad programs
    pub extra_patterns: Vec<MintPattern>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            provider: DiscoveryProvider::Helius,
            poll_interval_secs: 5,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages_per_cycle: DEFAULT_MAX_PAGES_PER_CYCLE,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            extra_patterns: Vec::new(),
        }
    }
}

/// Price loop configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceSection {
    pub provider: PriceProvider,
    pub poll_interval_secs: u64,
    /// Drop from the all-time high, in percent, that fires the alert
    pub drawdown_threshold_pct: f64,
    pub max_concurrent_fetches: usize,
}

impl Default for PriceSection {
    fn default() -> Self {
        Self {
            provider: PriceProvider::Dexscreener,
            poll_interval_secs: 10,
            drawdown_threshold_pct: DEFAULT_DRAWDOWN_THRESHOLD_PCT,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeliusSection {
    pub api_url: String,
    pub api_key: String,
}

impl Default for HeliusSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HELIUS_API_URL.to_string(),
            api_key: String::new(),
        }
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSection {
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    pub commitment: String,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DexScreenerSection {
    pub api_url: String,
    pub chain_id: String,
}

impl Default for DexScreenerSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DEXSCREENER_API.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
        }
    }
}

/// Jupiter price API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    pub api_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_JUPITER_PRICE_API.to_string(),
            api_key: None,
        }
    }
}

impl JupiterSection {
    /// Configured key, ignoring an empty string
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.is_empty())
    }
}

/// Telegram notification section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
    /// Send a greeting when the watcher starts
    pub announce_startup: bool,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            announce_startup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Timeout applied to every provider request
    pub request_timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self { request_timeout_secs: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file and fill empty values from the environment
///
/// The result is not validated; call [`Config::validate`] once the run mode
/// is known.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn fill(target: &mut String, value: Option<String>) {
    if target.is_empty() {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            *target = v;
        }
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message))
}

impl Config {
    /// Fill empty secret and identity fields from `lookup`
    ///
    /// `SOLANA_RPC_URL` always wins over the file value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.wallet.address, lookup("WALLET_ADDRESS"));
        fill(&mut self.helius.api_key, lookup("HELIUS_API_KEY"));
        fill(&mut self.telegram.bot_token, lookup("TELEGRAM_BOT_TOKEN"));
        fill(&mut self.telegram.chat_id, lookup("TELEGRAM_CHAT_ID"));

        if let Some(url) = lookup("SOLANA_RPC_URL").filter(|v| !v.is_empty()) {
            self.solana.rpc_url = url;
        }
        if self.jupiter.api_key().is_none() {
            self.jupiter.api_key = lookup("JUPITER_API_KEY").filter(|v| !v.is_empty());
        }
    }

    /// Validate all configuration parameters
    ///
    /// With `dry_run` the Telegram credentials may be missing.
    pub fn validate(&self, dry_run: bool) -> Result<(), ConfigError> {
        if self.wallet.address.is_empty() {
            return invalid("wallet.address cannot be empty (set it or WALLET_ADDRESS)".to_string());
        }
        if !is_valid_address(&self.wallet.address) {
            return invalid(format!("wallet.address is not a valid address: {}", self.wallet.address));
        }

        if self.discovery.poll_interval_secs == 0 {
            return invalid("discovery.poll_interval_secs must be > 0".to_string());
        }
        if self.discovery.page_size == 0 || self.discovery.page_size > MAX_PAGE_SIZE {
            return invalid(format!(
                "discovery.page_size must be 1-{}, got {}",
                MAX_PAGE_SIZE, self.discovery.page_size
            ));
        }
        if self.discovery.max_pages_per_cycle == 0 {
            return invalid("discovery.max_pages_per_cycle must be > 0".to_string());
        }
        if self.discovery.seen_capacity < self.discovery.page_size {
            return invalid(format!(
                "discovery.seen_capacity ({}) must be >= page_size ({})",
                self.discovery.seen_capacity, self.discovery.page_size
            ));
        }

        if self.price.poll_interval_secs == 0 {
            return invalid("price.poll_interval_secs must be > 0".to_string());
        }
        let threshold = self.price.drawdown_threshold_pct;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return invalid(format!("price.drawdown_threshold_pct must be in (0, 100], got {}", threshold));
        }
        if self.price.max_concurrent_fetches == 0 {
            return invalid("price.max_concurrent_fetches must be >= 1".to_string());
        }

        if self.http.request_timeout_secs == 0 {
            return invalid("http.request_timeout_secs must be > 0".to_string());
        }

        match self.discovery.provider {
            DiscoveryProvider::Helius => {
                if self.helius.api_key.is_empty() {
                    return invalid("helius.api_key is required for the helius provider (or HELIUS_API_KEY)".to_string());
                }
                if self.helius.api_url.is_empty() {
                    return invalid("helius.api_url cannot be empty".to_string());
                }
            }
            DiscoveryProvider::Rpc => {
                if self.solana.rpc_url.is_empty() {
                    return invalid("solana.rpc_url cannot be empty".to_string());
                }
                if !matches!(self.solana.commitment.as_str(), "processed" | "confirmed" | "finalized") {
                    return invalid(format!("solana.commitment is not a known level: {}", self.solana.commitment));
                }
            }
        }

        if !dry_run {
            if self.telegram.bot_token.is_empty() {
                return invalid("telegram.bot_token cannot be empty (or TELEGRAM_BOT_TOKEN)".to_string());
            }
            if self.telegram.chat_id.is_empty() {
                return invalid("telegram.chat_id cannot be empty (or TELEGRAM_CHAT_ID)".to_string());
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery.poll_interval_secs)
    }

    pub fn price_interval(&self) -> Duration {
        Duration::from_secs(self.price.poll_interval_secs)
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            wallet: self.wallet.address.clone(),
            page_size: self.discovery.page_size,
            max_pages_per_cycle: self.discovery.max_pages_per_cycle,
            seen_capacity: self.discovery.seen_capacity,
        }
    }

    pub fn price_monitor_config(&self) -> PriceMonitorConfig {
        PriceMonitorConfig {
            threshold_pct: self.price.drawdown_threshold_pct,
            max_concurrent_fetches: self.price.max_concurrent_fetches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn create_valid_config() -> String {
        format!(
            r#"
[wallet]
address = "{}"

[discovery]
provider = "helius"
poll_interval_secs = 5
page_size = 5
max_pages_per_cycle = 10
seen_capacity = 10000
extra_patterns = [
    {{ program = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", kind = "create" }},
]

[price]
provider = "dexscreener"
poll_interval_secs = 10
drawdown_threshold_pct = 35.0
max_concurrent_fetches = 4

[helius]
api_key = "helius-test-key"

[telegram]
bot_token = "123:abc"
chat_id = "-100123"

[logging]
level = "debug"
format = "json"
"#,
            WALLET
        )
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn parse(content: &str) -> Config {
        toml::from_str(content).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        config.validate(false).unwrap();

        assert_eq!(config.wallet.address, WALLET);
        assert_eq!(config.discovery.provider, DiscoveryProvider::Helius);
        assert_eq!(config.discovery.extra_patterns.len(), 1);
        assert_eq!(config.discovery.extra_patterns[0].kind, "create");
        assert_eq!(config.price.provider, PriceProvider::Dexscreener);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.discovery_interval(), Duration::from_secs(5));
        assert_eq!(config.price_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/watcher.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(&format!("[wallet]\naddress = \"{}\"\n", WALLET));

        assert_eq!(config.discovery.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.discovery.seen_capacity, DEFAULT_SEEN_CAPACITY);
        assert_eq!(config.price.drawdown_threshold_pct, 35.0);
        assert_eq!(config.price.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
        assert_eq!(config.http.request_timeout_secs, 5);
        assert!(config.telegram.announce_startup);
        assert_eq!(config.solana.commitment, "confirmed");
        assert_eq!(config.jupiter.api_key(), None);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let content = format!("[wallet]\naddress = \"{}\"\n[price]\nprovider = \"coingecko\"\n", WALLET);
        let file = write_config(&content);
        assert!(matches!(load_config(file.path()).unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_fills_empty_values_only() {
        let mut config = parse("[wallet]\naddress = \"\"\n[telegram]\nchat_id = \"from-file\"\n");
        config.apply_env_overrides(env(&[
            ("WALLET_ADDRESS", WALLET),
            ("HELIUS_API_KEY", "env-key"),
            ("TELEGRAM_BOT_TOKEN", "9:xyz"),
            ("TELEGRAM_CHAT_ID", "from-env"),
            ("JUPITER_API_KEY", "jup"),
            ("SOLANA_RPC_URL", "https://rpc.example"),
        ]));

        assert_eq!(config.wallet.address, WALLET);
        assert_eq!(config.helius.api_key, "env-key");
        assert_eq!(config.telegram.bot_token, "9:xyz");
        assert_eq!(config.telegram.chat_id, "from-file");
        assert_eq!(config.jupiter.api_key(), Some("jup".to_string()));
        assert_eq!(config.solana.rpc_url, "https://rpc.example");
        config.validate(false).unwrap();
    }

    #[test]
    fn test_missing_wallet_rejected() {
        let config = parse("[wallet]\n");
        assert!(matches!(config.validate(true), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_wallet_rejected() {
        let mut config = parse(&create_valid_config());
        config.wallet.address = "not-base58!".to_string();
        let err = config.validate(false).unwrap_err();
        assert!(err.to_string().contains("wallet.address"));
    }

    #[test]
    fn test_invalid_threshold() {
        for bad in [0.0, -5.0, 100.5, f64::NAN] {
            let mut config = parse(&create_valid_config());
            config.price.drawdown_threshold_pct = bad;
            assert!(config.validate(false).is_err(), "threshold {} accepted", bad);
        }
        let mut config = parse(&create_valid_config());
        config.price.drawdown_threshold_pct = 100.0;
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_invalid_intervals_and_sizes() {
        let mut config = parse(&create_valid_config());
        config.discovery.poll_interval_secs = 0;
        assert!(config.validate(false).is_err());

        let mut config = parse(&create_valid_config());
        config.price.poll_interval_secs = 0;
        assert!(config.validate(false).is_err());

        let mut config = parse(&create_valid_config());
        config.discovery.page_size = 101;
        assert!(config.validate(false).is_err());

        let mut config = parse(&create_valid_config());
        config.discovery.seen_capacity = 2;
        assert!(config.validate(false).is_err());

        let mut config = parse(&create_valid_config());
        config.price.max_concurrent_fetches = 0;
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_helius_requires_key() {
        let mut config = parse(&create_valid_config());
        config.helius.api_key.clear();
        let err = config.validate(false).unwrap_err();
        assert!(err.to_string().contains("helius.api_key"));

        config.discovery.provider = DiscoveryProvider::Rpc;
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_rpc_commitment_checked() {
        let mut config = parse(&create_valid_config());
        config.discovery.provider = DiscoveryProvider::Rpc;
        config.solana.commitment = "fast".to_string();
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_telegram_optional_in_dry_run() {
        let mut config = parse(&create_valid_config());
        config.telegram.bot_token.clear();
        config.telegram.chat_id.clear();

        assert!(config.validate(false).is_err());
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_loop_configs() {
        let config = parse(&create_valid_config());
        let discovery = config.discovery_config();
        assert_eq!(discovery.wallet, WALLET);
        assert_eq!(discovery.max_pages_per_cycle, 10);

        let price = config.price_monitor_config();
        assert_eq!(price.threshold_pct, 35.0);
        assert_eq!(price.max_concurrent_fetches, 4);
    }
}
