//! Discovery Loop
//!
//! Walks the newest window of wallet activity, finds mint-creation
//! operations in entries not seen before and registers the new mints.
//!
//! Pagination is backward only: every page is requested newest-first with
//! `until = cursor`, and older pages follow with `before = oldest entry so
//! far` while pages come back full. Without a cursor (first cycle) a single
//! page is read. Registrations, the seen set and the cursor are staged and
//! committed only after the whole window was processed.
//!
//! When `max_pages_per_cycle` runs out before the cursor is reached the
//! cursor stays put and the next cycle resumes below the oldest entry
//! fetched. The cursor moves to the newest entry of the gap only once the
//! backfill reaches it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{MintDetector, MintMatch, SeenSignatures, TokenRegistry, TrackedToken};
use crate::ports::{ActivityEntry, ActivityFeed, FetchError, PageRequest};

use super::guard::{CycleOutcome, InFlightGuard};
use super::messages::{self, AlertSink};

/// Default number of entries requested per page
pub const DEFAULT_PAGE_SIZE: usize = 5;
/// Default cap on pages walked in one cycle
pub const DEFAULT_MAX_PAGES_PER_CYCLE: usize = 10;

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub wallet: String,
    pub page_size: usize,
    pub max_pages_per_cycle: usize,
    pub seen_capacity: usize,
}

impl DiscoveryConfig {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages_per_cycle: DEFAULT_MAX_PAGES_PER_CYCLE,
            seen_capacity: crate::domain::DEFAULT_SEEN_CAPACITY,
        }
    }
}

/// Summary of one completed discovery cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    pub pages_fetched: usize,
    /// Entries in the window after cutting at the cursor
    pub entries_in_window: usize,
    /// Entries not seen before and therefore resolved
    pub entries_evaluated: usize,
    /// Newly registered mints, feed order
    pub discovered: Vec<String>,
    /// Matched operations without a readable mint
    pub malformed: usize,
    pub cursor: Option<String>,
    /// Set when the page cap cut the window short
    pub resume_before: Option<String>,
}

/// Unfinished walk between the cursor and a newer head
#[derive(Debug, Clone, PartialEq)]
struct Backfill {
    /// Newest entry of the gap; becomes the cursor once the walk finishes
    newest: String,
    /// Oldest entry fetched so far
    before: String,
}

#[derive(Debug)]
struct DiscoveryState {
    cursor: Option<String>,
    seen: SeenSignatures,
    backfill: Option<Backfill>,
}

/// Entries fetched in one cycle, newest first
struct Window {
    entries: Vec<ActivityEntry>,
    /// Oldest entry fetched when the page cap hit before the cursor
    truncated_at: Option<String>,
}

pub struct DiscoveryLoop {
    feed: Arc<dyn ActivityFeed>,
    registry: TokenRegistry,
    detector: MintDetector,
    sink: AlertSink,
    config: DiscoveryConfig,
    state: Mutex<DiscoveryState>,
    guard: InFlightGuard,
}

impl DiscoveryLoop {
    pub fn new(
        feed: Arc<dyn ActivityFeed>,
        registry: TokenRegistry,
        detector: MintDetector,
        sink: AlertSink,
        config: DiscoveryConfig,
    ) -> Self {
        let seen = SeenSignatures::new(config.seen_capacity);
        Self {
            feed,
            registry,
            detector,
            sink,
            config,
            state: Mutex::new(DiscoveryState {
                cursor: None,
                seen,
                backfill: None,
            }),
            guard: InFlightGuard::new(),
        }
    }

    pub async fn cursor(&self) -> Option<String> {
        self.state.lock().await.cursor.clone()
    }

    pub async fn seen_count(&self) -> usize {
        self.state.lock().await.seen.len()
    }

    /// Run one cycle and log the outcome; used by the scheduler
    pub async fn tick(&self) {
        match self.run_cycle().await {
            Ok(CycleOutcome::Completed(report)) => {
                if report.discovered.is_empty() {
                    debug!(
                        pages = report.pages_fetched,
                        evaluated = report.entries_evaluated,
                        "Discovery cycle complete, no new tokens"
                    );
                } else {
                    info!(
                        discovered = report.discovered.len(),
                        evaluated = report.entries_evaluated,
                        "Discovery cycle complete"
                    );
                }
            }
            Ok(CycleOutcome::Skipped) => {
                debug!("Previous discovery cycle still running, tick skipped");
            }
            Err(e) => {
                warn!(feed = self.feed.name(), error = %e, "Discovery cycle aborted, retrying next tick");
            }
        }
    }

    /// Run one guarded cycle
    ///
    /// A fetch or resolve failure leaves the cursor, the seen set and the
    /// registry exactly as they were.
    pub async fn run_cycle(&self) -> Result<CycleOutcome<DiscoveryReport>, FetchError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(CycleOutcome::Skipped);
        };
        self.scan().await.map(CycleOutcome::Completed)
    }

    async fn scan(&self) -> Result<DiscoveryReport, FetchError> {
        let mut state = self.state.lock().await;
        let cursor = state.cursor.clone();
        let resume = state.backfill.as_ref().map(|b| b.before.clone());
        let mut report = DiscoveryReport::default();

        let Window { entries: window, truncated_at } = self
            .fetch_window(cursor.as_deref(), resume, &mut report)
            .await?;
        report.entries_in_window = window.len();

        let mut staged_seen: Vec<String> = Vec::new();
        let mut staged_set: HashSet<&str> = HashSet::new();
        let mut staged_tokens: Vec<TrackedToken> = Vec::new();

        for entry in &window {
            if state.seen.contains(&entry.signature) || staged_set.contains(entry.signature.as_str()) {
                continue;
            }
            report.entries_evaluated += 1;

            let operations = self.feed.resolve_operations(entry).await?;
            for found in self.detector.scan(&operations) {
                match found {
                    MintMatch::Mint(mint) => {
                        if staged_tokens.iter().any(|t| t.mint == mint) || self.registry.contains(&mint).await {
                            debug!(mint = %mint, signature = %entry.signature, "Mint already tracked");
                            continue;
                        }
                        let created_at = entry.block_time.unwrap_or_else(Utc::now);
                        staged_tokens.push(TrackedToken::new(mint, created_at, entry.signature.clone()));
                    }
                    MintMatch::MissingMint { kind } => {
                        report.malformed += 1;
                        warn!(
                            signature = %entry.signature,
                            kind = %kind,
                            "Mint instruction without a mint address, skipped"
                        );
                    }
                }
            }

            staged_set.insert(entry.signature.as_str());
            staged_seen.push(entry.signature.clone());
        }

        // Commit
        let mut registered = Vec::new();
        for token in staged_tokens {
            if self.registry.register(token.clone()).await {
                registered.push(token);
            }
        }
        state.seen.extend(staged_seen);
        let newest = state
            .backfill
            .take()
            .map(|b| b.newest)
            .or_else(|| window.first().map(|e| e.signature.clone()));
        match (truncated_at, newest) {
            (Some(before), Some(newest)) => {
                state.backfill = Some(Backfill { newest, before });
            }
            (_, Some(newest)) => state.cursor = Some(newest),
            (_, None) => {}
        }
        report.cursor = state.cursor.clone();
        report.resume_before = state.backfill.as_ref().map(|b| b.before.clone());
        drop(state);

        for token in &registered {
            info!(
                mint = %token.mint,
                created_at = %token.created_at,
                signature = %token.discovered_by,
                "New token discovered"
            );
            self.sink
                .deliver(&messages::token_discovered(&token.mint, token.created_at))
                .await;
        }
        report.discovered = registered.into_iter().map(|t| t.mint).collect();

        Ok(report)
    }

    /// Fetch entries newer than `cursor`, newest first, starting below `before`
    async fn fetch_window(
        &self,
        cursor: Option<&str>,
        mut before: Option<String>,
        report: &mut DiscoveryReport,
    ) -> Result<Window, FetchError> {
        let limit = self.config.page_size.max(1);
        let max_pages = self.config.max_pages_per_cycle.max(1);
        let until = cursor.map(str::to_string);

        let mut window: Vec<ActivityEntry> = Vec::new();
        let mut truncated_at: Option<String> = None;

        if let Some(resume) = &before {
            debug!(before = %resume, "Resuming backfill");
        }

        loop {
            let page = PageRequest::newest(limit)
                .until(until.clone())
                .before(before.clone());
            let entries = self
                .feed
                .fetch_recent_activity(&self.config.wallet, &page)
                .await?;
            report.pages_fetched += 1;

            let full = entries.len() >= limit;
            let oldest = entries.last().map(|e| e.signature.clone());
            // Providers that ignore `until` still get cut at the cursor
            let reached_cursor = cursor.is_some_and(|c| entries.iter().any(|e| e.signature == c));
            window.extend(
                entries
                    .into_iter()
                    .take_while(|e| Some(e.signature.as_str()) != cursor),
            );

            if cursor.is_none() || !full || reached_cursor || report.pages_fetched >= max_pages {
                if full && !reached_cursor && cursor.is_some() {
                    warn!(
                        pages = report.pages_fetched,
                        oldest = ?oldest,
                        "Page limit reached before the cursor, backfill resumes next cycle"
                    );
                    truncated_at = oldest;
                }
                break;
            }
            before = oldest;
        }

        Ok(Window {
            entries: window,
            truncated_at,
        })
    }
}
