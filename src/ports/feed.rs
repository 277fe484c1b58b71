//! Activity Feed Port
//!
//! Paginated, newest-first view of the transactions touching one wallet.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::models::FetchError;

/// One instruction inside a feed entry
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Program address that executed the instruction
    pub program_id: String,
    /// Human-readable program name when the provider parsed it (e.g. "spl-token")
    pub program: Option<String>,
    /// Parsed instruction type (e.g. "initializeMint2")
    pub kind: Option<String>,
    /// Parsed instruction parameters
    pub info: Value,
}

impl Operation {
    /// Read a string parameter from the parsed info
    pub fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }
}

/// One entry of the wallet activity feed
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    /// Transaction signature, unique per entry
    pub signature: String,
    /// Block time, when the provider knows it
    pub block_time: Option<DateTime<Utc>>,
    /// Operations delivered with the page; `None` when they must be resolved separately
    pub operations: Option<Vec<Operation>>,
}

impl ActivityEntry {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            block_time: None,
            operations: None,
        }
    }

    pub fn with_block_time(mut self, block_time: DateTime<Utc>) -> Self {
        self.block_time = Some(block_time);
        self
    }

    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = Some(operations);
        self
    }
}

/// Window of the feed to fetch
///
/// Both bounds are exclusive signatures. `until` stops the walk at an
/// already-processed entry, `before` continues an older page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub before: Option<String>,
    pub until: Option<String>,
}

impl PageRequest {
    pub fn newest(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn until(mut self, cursor: Option<String>) -> Self {
        self.until = cursor;
        self
    }

    pub fn before(mut self, signature: Option<String>) -> Self {
        self.before = signature;
        self
    }
}

/// Wallet activity provider
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Fetch one page of activity for `wallet`, newest first
    async fn fetch_recent_activity(
        &self,
        wallet: &str,
        page: &PageRequest,
    ) -> Result<Vec<ActivityEntry>, FetchError>;

    /// Resolve an entry to its operations
    ///
    /// Providers that deliver operations with the page need not override this.
    async fn resolve_operations(&self, entry: &ActivityEntry) -> Result<Vec<Operation>, FetchError> {
        entry.operations.clone().ok_or_else(|| {
            FetchError::MalformedResponse(format!(
                "{} delivered entry {} without operations",
                self.name(),
                entry.signature
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_request_builder() {
        let page = PageRequest::newest(5)
            .until(Some("cursor".to_string()))
            .before(Some("older".to_string()));

        assert_eq!(page.limit, 5);
        assert_eq!(page.until.as_deref(), Some("cursor"));
        assert_eq!(page.before.as_deref(), Some("older"));
    }

    #[test]
    fn test_operation_info_str() {
        let op = Operation {
            program_id: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".to_string(),
            program: Some("spl-token".to_string()),
            kind: Some("initializeMint2".to_string()),
            info: json!({ "mint": "Mint111", "decimals": 6 }),
        };

        assert_eq!(op.info_str("mint"), Some("Mint111"));
        assert_eq!(op.info_str("decimals"), None);
        assert_eq!(op.info_str("missing"), None);
    }
}
