//! Scripted port doubles
//!
//! Deterministic stand-ins for the feed, price and notifier ports. They record
//! every call and replay queued responses so loop behaviour can be tested
//! without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::feed::{ActivityEntry, ActivityFeed, Operation, PageRequest};
use super::models::{FetchError, NotifyError};
use super::notifier::{MessageFormat, Notifier};
use super::price::{PriceQuote, PriceSource};

/// Queued response for the scripted feed
#[derive(Debug, Clone)]
pub enum FeedResponse {
    Page(Vec<ActivityEntry>),
    Fail(String),
}

/// Feed that replays queued pages
///
/// When the queue is empty the last page is replayed, which models a wallet
/// with no new activity.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFeed {
    responses: Arc<Mutex<VecDeque<FeedResponse>>>,
    last_page: Arc<Mutex<Vec<ActivityEntry>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
    failing_resolves: Arc<Mutex<Vec<String>>>,
    resolved: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a page
    pub fn with_page(self, page: Vec<ActivityEntry>) -> Self {
        self.push_page(page);
        self
    }

    /// Builder method to queue a fetch failure
    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(FeedResponse::Fail(message.to_string()));
        self
    }

    /// Builder method to make resolving `signature` fail
    pub fn with_failing_resolve(self, signature: &str) -> Self {
        self.failing_resolves.lock().unwrap().push(signature.to_string());
        self
    }

    /// Builder method to delay every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a page after construction
    pub fn push_page(&self, page: Vec<ActivityEntry>) {
        self.responses.lock().unwrap().push_back(FeedResponse::Page(page));
    }

    /// Stop failing resolves
    pub fn clear_failing_resolves(&self) {
        self.failing_resolves.lock().unwrap().clear();
    }

    /// Get all recorded page requests
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get all signatures passed to `resolve_operations`
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityFeed for ScriptedFeed {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_recent_activity(
        &self,
        _wallet: &str,
        page: &PageRequest,
    ) -> Result<Vec<ActivityEntry>, FetchError> {
        self.requests.lock().unwrap().push(page.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(FeedResponse::Page(entries)) => {
                *self.last_page.lock().unwrap() = entries.clone();
                Ok(entries)
            }
            Some(FeedResponse::Fail(message)) => Err(FetchError::Network(message)),
            None => Ok(self.last_page.lock().unwrap().clone()),
        }
    }

    async fn resolve_operations(&self, entry: &ActivityEntry) -> Result<Vec<Operation>, FetchError> {
        self.resolved.lock().unwrap().push(entry.signature.clone());
        if self.failing_resolves.lock().unwrap().contains(&entry.signature) {
            return Err(FetchError::Network(format!("resolve failed for {}", entry.signature)));
        }
        Ok(entry.operations.clone().unwrap_or_default())
    }
}

/// Queued response for the scripted price source
#[derive(Debug, Clone)]
pub enum PriceResponse {
    Price(f64),
    NoData,
    Fail(String),
}

/// Price source that replays queued responses per mint
///
/// A mint with an empty queue reports no data.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrices {
    responses: Arc<Mutex<HashMap<String, VecDeque<PriceResponse>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a sequence of prices for a mint
    pub fn with_prices(self, mint: &str, prices: &[f64]) -> Self {
        for price in prices {
            self.push(mint, PriceResponse::Price(*price));
        }
        self
    }

    /// Builder method to queue a failure for a mint
    pub fn with_failure(self, mint: &str, message: &str) -> Self {
        self.push(mint, PriceResponse::Fail(message.to_string()));
        self
    }

    /// Queue a response after construction
    pub fn push(&self, mint: &str, response: PriceResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(mint.to_string())
            .or_default()
            .push_back(response);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for ScriptedPrices {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_price(&self, mint: &str) -> Result<Option<PriceQuote>, FetchError> {
        self.calls.lock().unwrap().push(mint.to_string());
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(mint)
            .and_then(VecDeque::pop_front)
            .unwrap_or(PriceResponse::NoData);

        match next {
            PriceResponse::Price(price) => Ok(Some(PriceQuote::new(price))),
            PriceResponse::NoData => Ok(None),
            PriceResponse::Fail(message) => Err(FetchError::Network(message)),
        }
    }
}

/// A message captured by the recording notifier
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub destination: String,
    pub text: String,
    pub format: MessageFormat,
}

/// Notifier that records messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to reject every message
    pub fn failing(self) -> Self {
        *self.failing.lock().unwrap() = true;
        self
    }

    /// Get all recorded messages
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages whose text contains `needle`
    pub fn sent_containing(&self, needle: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.text.contains(needle))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        destination: &str,
        text: &str,
        format: MessageFormat,
    ) -> Result<(), NotifyError> {
        // Recorded even when failing so tests can see the attempt
        self.sent.lock().unwrap().push(SentMessage {
            destination: destination.to_string(),
            text: text.to_string(),
            format,
        });
        if *self.failing.lock().unwrap() {
            return Err(NotifyError::Network("channel down".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_feed_replays_last_page() {
        let feed = ScriptedFeed::new().with_page(vec![ActivityEntry::new("sig1")]);

        let first = feed.fetch_recent_activity("wallet", &PageRequest::newest(5)).await.unwrap();
        let second = feed.fetch_recent_activity("wallet", &PageRequest::newest(5)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(feed.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_prices() {
        let prices = ScriptedPrices::new()
            .with_prices("MintA", &[1.0])
            .with_failure("MintA", "boom");

        let quote = prices.fetch_price("MintA").await.unwrap();
        assert_eq!(quote, Some(PriceQuote::new(1.0)));
        assert!(prices.fetch_price("MintA").await.is_err());
        assert_eq!(prices.fetch_price("MintA").await.unwrap(), None);
        assert_eq!(prices.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.send("chat", "hello", MessageFormat::Plain).await.unwrap();

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent_containing("hello")[0].destination, "chat");

        let failing = RecordingNotifier::new().failing();
        assert!(failing.send("chat", "hello", MessageFormat::Html).await.is_err());
        assert_eq!(failing.sent().len(), 1);
    }
}
