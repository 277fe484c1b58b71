//! Price Loop
//!
//! Polls the price of every tracked token that has not alerted yet, raises
//! its all-time-high and fires the one-shot drawdown alert.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::{Observation, TokenRegistry, DEFAULT_DRAWDOWN_THRESHOLD_PCT};
use crate::ports::PriceSource;

use super::guard::{CycleOutcome, InFlightGuard};
use super::messages::{self, AlertSink};

/// Default number of price requests in flight during one cycle
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

#[derive(Debug, Clone)]
pub struct PriceMonitorConfig {
    pub threshold_pct: f64,
    pub max_concurrent_fetches: usize,
}

impl Default for PriceMonitorConfig {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_DRAWDOWN_THRESHOLD_PCT,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Summary of one completed price cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceReport {
    pub checked: usize,
    pub updated: usize,
    pub no_data: usize,
    pub failed: usize,
    /// Mints that alerted this cycle
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenOutcome {
    Updated,
    Alerted(String),
    NoData,
    Failed,
    /// Alerted or removed between snapshot and observation
    Stale,
}

pub struct PriceLoop {
    prices: Arc<dyn PriceSource>,
    registry: TokenRegistry,
    sink: AlertSink,
    config: PriceMonitorConfig,
    guard: InFlightGuard,
}

impl PriceLoop {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        registry: TokenRegistry,
        sink: AlertSink,
        config: PriceMonitorConfig,
    ) -> Self {
        Self {
            prices,
            registry,
            sink,
            config,
            guard: InFlightGuard::new(),
        }
    }

    /// Run one cycle and log the outcome; used by the scheduler
    pub async fn tick(&self) {
        match self.run_cycle().await {
            CycleOutcome::Completed(report) => {
                if report.checked > 0 {
                    debug!(
                        checked = report.checked,
                        updated = report.updated,
                        no_data = report.no_data,
                        failed = report.failed,
                        alerts = report.alerts.len(),
                        "Price cycle complete"
                    );
                }
            }
            CycleOutcome::Skipped => {
                debug!("Previous price cycle still running, tick skipped");
            }
        }
    }

    /// Run one guarded cycle
    ///
    /// Never fails as a whole: per-token failures are counted in the report.
    pub async fn run_cycle(&self) -> CycleOutcome<PriceReport> {
        let Some(_permit) = self.guard.try_acquire() else {
            return CycleOutcome::Skipped;
        };

        let pending = self.registry.pending().await;
        let mut report = PriceReport {
            checked: pending.len(),
            ..Default::default()
        };

        let outcomes: Vec<TokenOutcome> = stream::iter(pending)
            .map(|mint| self.check_token(mint))
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                TokenOutcome::Updated => report.updated += 1,
                TokenOutcome::Alerted(mint) => {
                    report.updated += 1;
                    report.alerts.push(mint);
                }
                TokenOutcome::NoData | TokenOutcome::Stale => report.no_data += 1,
                TokenOutcome::Failed => report.failed += 1,
            }
        }
        report.alerts.sort();

        CycleOutcome::Completed(report)
    }

    async fn check_token(&self, mint: String) -> TokenOutcome {
        let quote = match self.prices.fetch_price(&mint).await {
            Ok(Some(quote)) if quote.is_usable() => quote,
            Ok(Some(quote)) => {
                debug!(mint = %mint, price = quote.price_usd, "Unusable price, skipped");
                return TokenOutcome::NoData;
            }
            Ok(None) => {
                debug!(mint = %mint, source = self.prices.name(), "No price data yet");
                return TokenOutcome::NoData;
            }
            Err(e) if e.is_malformed() => {
                warn!(mint = %mint, source = self.prices.name(), error = %e, "Malformed price response, skipped");
                return TokenOutcome::NoData;
            }
            Err(e) => {
                warn!(mint = %mint, source = self.prices.name(), error = %e, "Price fetch failed");
                return TokenOutcome::Failed;
            }
        };

        let observation = self
            .registry
            .observe(
                &mint,
                quote.price_usd,
                quote.liquidity_usd,
                self.config.threshold_pct,
                Utc::now(),
            )
            .await;

        match observation {
            Some(Observation::Tracked { all_time_high, drop_pct, new_high }) => {
                debug!(
                    mint = %mint,
                    price = quote.price_usd,
                    ath = all_time_high,
                    drop_pct = drop_pct.unwrap_or(0.0),
                    new_high,
                    "Price updated"
                );
                TokenOutcome::Updated
            }
            Some(Observation::Alert(alert)) => {
                info!(
                    mint = %alert.mint,
                    drop_pct = alert.drop_pct,
                    ath = alert.all_time_high,
                    price = alert.price,
                    elapsed = %alert.elapsed,
                    "Drawdown threshold crossed"
                );
                self.sink.deliver(&messages::drawdown_alert(&alert)).await;
                TokenOutcome::Alerted(mint)
            }
            Some(Observation::Unusable) => TokenOutcome::NoData,
            Some(Observation::AlreadyAlerted) | None => TokenOutcome::Stale,
        }
    }
}
