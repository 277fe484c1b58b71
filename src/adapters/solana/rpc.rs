use async_trait::async_trait;
use chrono::DateTime;
use solana_client::rpc_client::{GetConfirmedSignaturesForAddress2Config, RpcClient};
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::ports::{ActivityEntry, ActivityFeed, FetchError, Operation, PageRequest};

use super::instructions::operations_from_rpc_transaction;

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Unknown commitment level: {0}")]
    InvalidCommitment(String),
}

impl From<SolanaClientError> for FetchError {
    fn from(err: SolanaClientError) -> Self {
        match err {
            SolanaClientError::RpcError(msg) => FetchError::Network(msg),
            other => FetchError::InvalidInput(other.to_string()),
        }
    }
}

/// Parse a commitment name from configuration
pub fn parse_commitment(level: &str) -> Result<CommitmentConfig, SolanaClientError> {
    match level {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(SolanaClientError::InvalidCommitment(other.to_string())),
    }
}

/// Wallet activity feed backed by plain Solana JSON-RPC
///
/// `getSignaturesForAddress` lists the page; each unseen entry is resolved
/// with its own `getTransaction` call.
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl SolanaClient {
    /// Create a new Solana RPC client with an explicit request timeout
    pub fn new(rpc_url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(rpc_url, timeout, commitment));
        Self { client, commitment }
    }

    fn parse_signature(value: &str) -> Result<Signature, SolanaClientError> {
        Signature::from_str(value).map_err(|e| SolanaClientError::InvalidSignature(format!("{}: {}", value, e)))
    }

    fn parse_optional_signature(value: Option<&str>) -> Result<Option<Signature>, SolanaClientError> {
        value.map(Self::parse_signature).transpose()
    }
}

#[async_trait]
impl ActivityFeed for SolanaClient {
    fn name(&self) -> &str {
        "solana-rpc"
    }

    async fn fetch_recent_activity(
        &self,
        wallet: &str,
        page: &PageRequest,
    ) -> Result<Vec<ActivityEntry>, FetchError> {
        let address = Pubkey::from_str(wallet)
            .map_err(|e| SolanaClientError::InvalidPublicKey(format!("{}: {}", wallet, e)))?;
        let config = GetConfirmedSignaturesForAddress2Config {
            before: Self::parse_optional_signature(page.before.as_deref())?,
            until: Self::parse_optional_signature(page.until.as_deref())?,
            limit: Some(page.limit),
            commitment: Some(self.commitment),
        };

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        let statuses = tokio::task::spawn_blocking(move || {
            client
                .get_signatures_for_address_with_config(&address, config)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| FetchError::Network(format!("Task join error: {}", e)))??;

        Ok(statuses
            .into_iter()
            .map(|status| {
                let entry = ActivityEntry::new(status.signature);
                match status.block_time.and_then(|t| DateTime::from_timestamp(t, 0)) {
                    Some(time) => entry.with_block_time(time),
                    None => entry,
                }
            })
            .collect())
    }

    async fn resolve_operations(&self, entry: &ActivityEntry) -> Result<Vec<Operation>, FetchError> {
        let signature = Self::parse_signature(&entry.signature)?;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        let client = Arc::clone(&self.client);
        let tx = tokio::task::spawn_blocking(move || {
            client
                .get_transaction_with_config(&signature, config)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| FetchError::Network(format!("Task join error: {}", e)))??;

        let value = serde_json::to_value(&tx)
            .map_err(|e| FetchError::MalformedResponse(format!("transaction {}: {}", entry.signature, e)))?;
        operations_from_rpc_transaction(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SolanaClient {
        SolanaClient::new(
            "https://api.devnet.solana.com".to_string(),
            CommitmentConfig::confirmed(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.name(), "solana-rpc");
    }

    #[test]
    fn test_parse_commitment() {
        assert_eq!(parse_commitment("finalized").unwrap(), CommitmentConfig::finalized());
        assert!(parse_commitment("fast").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = SolanaClientError::RpcError("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));
    }

    #[tokio::test]
    async fn test_invalid_wallet_rejected_before_network() {
        let err = client()
            .fetch_recent_activity("not-a-pubkey", &PageRequest::newest(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_cursor_rejected_before_network() {
        let page = PageRequest::newest(5).until(Some("bogus".to_string()));
        let err = client()
            .fetch_recent_activity("So11111111111111111111111111111111111111112", &page)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
    }
}
