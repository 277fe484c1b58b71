//! Token Registry
//!
//! Shared map from mint to tracking state. Cloning the registry clones the
//! handle, not the map: the discovery and price loops hold the same registry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::token::{Observation, TrackedToken};

#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Arc<RwLock<HashMap<String, TrackedToken>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new token; returns false if the mint is already tracked
    pub async fn register(&self, token: TrackedToken) -> bool {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.mint) {
            return false;
        }
        tokens.insert(token.mint.clone(), token);
        true
    }

    pub async fn contains(&self, mint: &str) -> bool {
        self.tokens.read().await.contains_key(mint)
    }

    pub async fn get(&self, mint: &str) -> Option<TrackedToken> {
        self.tokens.read().await.get(mint).cloned()
    }

    /// Mints still waiting for their drawdown alert
    pub async fn pending(&self) -> Vec<String> {
        let tokens = self.tokens.read().await;
        let mut mints: Vec<String> = tokens
            .values()
            .filter(|t| !t.alerted)
            .map(|t| t.mint.clone())
            .collect();
        mints.sort();
        mints
    }

    /// Apply one observation under the write lock
    ///
    /// The high update, drawdown check and alert flag change happen in a
    /// single critical section, so a token can never alert twice. Returns
    /// `None` when the mint is unknown.
    pub async fn observe(
        &self,
        mint: &str,
        price: f64,
        liquidity_usd: Option<f64>,
        threshold_pct: f64,
        now: DateTime<Utc>,
    ) -> Option<Observation> {
        let mut tokens = self.tokens.write().await;
        tokens
            .get_mut(mint)
            .map(|token| token.observe(price, liquidity_usd, threshold_pct, now))
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    pub async fn alerted_count(&self) -> usize {
        self.tokens.read().await.values().filter(|t| t.alerted).count()
    }

    /// Copy of every tracked token, oldest first
    pub async fn snapshot(&self) -> Vec<TrackedToken> {
        let tokens = self.tokens.read().await;
        let mut all: Vec<TrackedToken> = tokens.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.mint.cmp(&b.mint)));
        all
    }
}
