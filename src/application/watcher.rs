//! Watcher
//!
//! Owns the two polling timers. Each tick spawns one cycle so a slow cycle
//! never delays the timer; the loops' own guards turn overlapping ticks into
//! no-ops. `stop()` halts both timers and `run()` returns once every
//! in-flight cycle has finished.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::domain::TokenRegistry;

use super::discovery::DiscoveryLoop;
use super::price_monitor::PriceLoop;

/// Default discovery poll interval
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(5);
/// Default price poll interval
pub const DEFAULT_PRICE_INTERVAL: Duration = Duration::from_secs(10);

/// Status snapshot of the watcher
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherStatus {
    pub is_running: bool,
    pub tracked_tokens: usize,
    pub alerted_tokens: usize,
    pub seen_signatures: usize,
    pub cursor: Option<String>,
}

#[derive(Clone)]
pub struct Watcher {
    discovery: Arc<DiscoveryLoop>,
    price: Arc<PriceLoop>,
    registry: TokenRegistry,
    discovery_interval: Duration,
    price_interval: Duration,
    shutdown: Arc<watch::Sender<bool>>,
    is_running: Arc<watch::Sender<bool>>,
}

impl Watcher {
    pub fn new(discovery: DiscoveryLoop, price: PriceLoop, registry: TokenRegistry) -> Self {
        Self {
            discovery: Arc::new(discovery),
            price: Arc::new(price),
            registry,
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            price_interval: DEFAULT_PRICE_INTERVAL,
            shutdown: Arc::new(watch::channel(false).0),
            is_running: Arc::new(watch::channel(false).0),
        }
    }

    /// Set custom poll intervals
    pub fn with_intervals(mut self, discovery: Duration, price: Duration) -> Self {
        self.discovery_interval = discovery;
        self.price_interval = price;
        self
    }

    /// Run both timers until `stop()` is called
    pub async fn run(&self) {
        let shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }
        self.is_running.send_replace(true);

        info!(
            discovery_interval = ?self.discovery_interval,
            price_interval = ?self.price_interval,
            "Starting watcher"
        );

        let discovery = Arc::clone(&self.discovery);
        let discovery_timer = schedule("discovery", self.discovery_interval, shutdown.clone(), move || {
            let discovery = Arc::clone(&discovery);
            async move { discovery.tick().await }
        });

        let price = Arc::clone(&self.price);
        let price_timer = schedule("price", self.price_interval, shutdown, move || {
            let price = Arc::clone(&price);
            async move { price.tick().await }
        });

        tokio::join!(discovery_timer, price_timer);

        self.is_running.send_replace(false);
        info!("Watcher stopped");
    }

    /// Stop both timers; in-flight cycles are allowed to finish
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
        info!("Stop signal sent to watcher");
    }

    /// Get current status snapshot
    pub async fn status(&self) -> WatcherStatus {
        WatcherStatus {
            is_running: *self.is_running.borrow(),
            tracked_tokens: self.registry.len().await,
            alerted_tokens: self.registry.alerted_count().await,
            seen_signatures: self.discovery.seen_count().await,
            cursor: self.discovery.cursor().await,
        }
    }
}

/// Fire `tick` every `period` until shutdown, then drain in-flight cycles
async fn schedule<F, Fut>(name: &'static str, period: Duration, mut shutdown: watch::Receiver<bool>, tick: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                in_flight.spawn(tick());
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(timer = name, error = %e, "Cycle task panicked");
                }
            }
        }
    }

    debug!(timer = name, in_flight = in_flight.len(), "Timer stopped, draining cycles");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(timer = name, error = %e, "Cycle task panicked");
        }
    }
}
