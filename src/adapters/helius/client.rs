//! Helius Enhanced Transactions Client
//!
//! `GET /v0/addresses/{wallet}/transactions` returns the wallet's newest
//! transactions with their instructions inline, so entries arrive already
//! resolved.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::http::{build_client, decode_json, fetch_json};
use crate::adapters::solana::instructions::push_instructions;
use crate::ports::{ActivityEntry, ActivityFeed, FetchError, PageRequest};

/// Default Helius API base URL
pub const DEFAULT_HELIUS_API_URL: &str = "https://api.helius.xyz";

/// Helius API client configuration
#[derive(Debug, Clone)]
pub struct HeliusConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl HeliusConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_HELIUS_API_URL.to_string(),
            api_key: api_key.into(),
            timeout: crate::adapters::http::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeliusClient {
    config: HeliusConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct EnhancedTransaction {
    signature: String,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    instructions: Vec<Value>,
}

impl From<EnhancedTransaction> for ActivityEntry {
    fn from(tx: EnhancedTransaction) -> Self {
        let mut operations = Vec::new();
        push_instructions(&tx.instructions, &mut operations);

        let entry = ActivityEntry::new(tx.signature).with_operations(operations);
        match tx.timestamp.and_then(|t| DateTime::from_timestamp(t, 0)) {
            Some(time) => entry.with_block_time(time),
            None => entry,
        }
    }
}

/// Decode an enhanced-transactions response body
pub fn parse_transactions(body: &str) -> Result<Vec<ActivityEntry>, FetchError> {
    let txs: Vec<EnhancedTransaction> = decode_json(body)?;
    Ok(txs.into_iter().map(ActivityEntry::from).collect())
}

impl HeliusClient {
    pub fn new(config: HeliusConfig) -> Result<Self, FetchError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    fn transactions_url(&self, wallet: &str) -> String {
        format!(
            "{}/v0/addresses/{}/transactions",
            self.config.api_url.trim_end_matches('/'),
            wallet
        )
    }
}

#[async_trait]
impl ActivityFeed for HeliusClient {
    fn name(&self) -> &str {
        "helius"
    }

    async fn fetch_recent_activity(
        &self,
        wallet: &str,
        page: &PageRequest,
    ) -> Result<Vec<ActivityEntry>, FetchError> {
        let mut query: Vec<(&str, String)> = vec![
            ("api-key", self.config.api_key.clone()),
            ("limit", page.limit.to_string()),
        ];
        if let Some(before) = &page.before {
            query.push(("before", before.clone()));
        }
        if let Some(until) = &page.until {
            query.push(("until", until.clone()));
        }

        let request = self.http.get(self.transactions_url(wallet)).query(&query);
        let txs: Vec<EnhancedTransaction> = fetch_json(request, self.config.timeout).await?;
        Ok(txs.into_iter().map(ActivityEntry::from).collect())
    }
}
