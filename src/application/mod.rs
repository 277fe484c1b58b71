pub mod guard;
pub mod messages;
pub mod discovery;
pub mod price_monitor;
pub mod watcher;

pub use guard::{CycleOutcome, InFlightGuard, InFlightPermit};
pub use messages::AlertSink;
pub use discovery::{DiscoveryConfig, DiscoveryLoop, DiscoveryReport};
pub use price_monitor::{PriceLoop, PriceMonitorConfig, PriceReport};
pub use watcher::{Watcher, WatcherStatus};
